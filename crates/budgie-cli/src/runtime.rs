// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use budgie_app::{AdviceRequest, PlanRequest, Reply};
use budgie_llm::{Client, DebtLine, ExpenseLine, Generation};
use budgie_tui::InternalEvent;
use std::sync::mpsc::Sender;
use std::thread;
use tracing::{debug, warn};

/// Runs advice and plan calls against the text-generation service. Each
/// spawned request gets its own worker thread and a clone of the client.
pub struct LlmRuntime {
    client: Client,
}

impl LlmRuntime {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn debt_lines(request: &AdviceRequest) -> Vec<DebtLine> {
    request
        .debts
        .iter()
        .map(|debt| DebtLine {
            name: debt.name.clone(),
            amount: debt.amount,
            apr: debt.apr,
        })
        .collect()
}

fn expense_lines(request: &PlanRequest) -> Vec<ExpenseLine> {
    request
        .items
        .iter()
        .map(|item| ExpenseLine {
            category: item.category.clone(),
            name: item.name.clone(),
            amount: item.amount,
        })
        .collect()
}

fn into_reply(generation: Generation) -> Reply {
    match generation {
        Generation::Text(text) => Reply::Answer(text),
        Generation::Apology(text) => Reply::Fallback(text.to_owned()),
    }
}

fn advise(client: &Client, request: &AdviceRequest) -> Reply {
    into_reply(client.debt_advice(
        request.income,
        request.total_expenses,
        &debt_lines(request),
        &request.question,
    ))
}

fn plan(client: &Client, request: &PlanRequest) -> Reply {
    into_reply(client.budget_plan(request.income, &expense_lines(request)))
}

impl budgie_tui::AppRuntime for LlmRuntime {
    fn run_debt_advice(&mut self, request: &AdviceRequest) -> Reply {
        advise(&self.client, request)
    }

    fn run_budget_plan(&mut self, request: &PlanRequest) -> Reply {
        plan(&self.client, request)
    }

    fn spawn_debt_advice(
        &mut self,
        request_id: u64,
        request: AdviceRequest,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let client = self.client.clone();
        thread::Builder::new()
            .name(format!("advice-{request_id}"))
            .spawn(move || {
                let reply = advise(&client, &request);
                if tx.send(InternalEvent::Advice { request_id, reply }).is_err() {
                    warn!(request_id, "ui closed before advice arrived");
                }
            })
            .context("spawn advice worker")?;
        debug!(request_id, "advice worker started");
        Ok(())
    }

    fn spawn_budget_plan(
        &mut self,
        request_id: u64,
        request: PlanRequest,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let client = self.client.clone();
        thread::Builder::new()
            .name(format!("plan-{request_id}"))
            .spawn(move || {
                let reply = plan(&client, &request);
                if tx.send(InternalEvent::Plan { request_id, reply }).is_err() {
                    warn!(request_id, "ui closed before budget plan arrived");
                }
            })
            .context("spawn plan worker")?;
        debug!(request_id, "plan worker started");
        Ok(())
    }
}
