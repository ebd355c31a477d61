// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::time::Duration;
use tracing::{debug, error, info};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

pub const ADVICE_APOLOGY: &str = "I'm sorry, I'm having trouble providing advice right now. Please check your connection and try again.";
pub const PLAN_APOLOGY: &str =
    "I'm sorry, I couldn't generate a budget plan at this moment. Please try again later.";

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Clone, PartialEq)]
pub struct DebtLine {
    pub name: String,
    pub amount: f64,
    pub apr: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseLine {
    pub category: String,
    pub name: String,
    pub amount: f64,
}

/// Outcome of an advice or plan call. Failures never escape as errors; they
/// collapse into the fixed apology for that action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generation {
    Text(String),
    Apology(&'static str),
}

impl Generation {
    pub fn text(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Apology(text) => text,
        }
    }

    pub fn is_apology(&self) -> bool {
        matches!(self, Self::Apology(_))
    }
}

#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    model: String,
    api_key: String,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, model: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("llm.base_url must not be empty");
        }
        let parsed = Url::parse(&base_url)
            .with_context(|| format!("llm.base_url {base_url:?} is not a valid URL"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!(
                "llm.base_url must use http or https, got {:?}",
                parsed.scheme()
            );
        }
        if model.trim().is_empty() {
            bail!("llm.model must not be empty");
        }
        if api_key.trim().is_empty() {
            bail!("API key must not be empty");
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            model: model.trim().to_owned(),
            api_key: api_key.trim().to_owned(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    /// One non-streaming generation call. Returns the concatenated text parts
    /// of the first candidate.
    pub fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest::user(prompt);
        debug!(model = %self.model, prompt_chars = prompt.len(), "sending generation request");
        let response = self
            .http
            .post(self.endpoint())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        let parsed: GenerateResponse = response.json().context("decode generation response")?;
        let text = parsed.into_text()?;
        info!(model = %self.model, response_chars = text.len(), "generation finished");
        Ok(text)
    }

    pub fn debt_advice(
        &self,
        income: f64,
        total_expenses: f64,
        debts: &[DebtLine],
        question: &str,
    ) -> Generation {
        let prompt = build_debt_advice_prompt(income, total_expenses, debts, question);
        match self.generate(&prompt) {
            Ok(text) => Generation::Text(text),
            Err(err) => {
                error!(error = %format!("{err:#}"), "debt advice request failed");
                Generation::Apology(ADVICE_APOLOGY)
            }
        }
    }

    pub fn budget_plan(&self, income: f64, items: &[ExpenseLine]) -> Generation {
        let prompt = build_budget_plan_prompt(income, items);
        match self.generate(&prompt) {
            Ok(text) => Generation::Text(text),
            Err(err) => {
                error!(error = %format!("{err:#}"), "budget plan request failed");
                Generation::Apology(PLAN_APOLOGY)
            }
        }
    }
}

pub fn build_debt_advice_prompt(
    income: f64,
    total_expenses: f64,
    debts: &[DebtLine],
    question: &str,
) -> String {
    let mut out = String::new();
    out.push_str("You are an expert financial advisor. A user needs help with their debt.\n");
    out.push_str("Here is their financial situation:\n");
    let _ = writeln!(out, "- Monthly Income: ${income:.2}");
    let _ = writeln!(out, "- Total Monthly Expenses: ${total_expenses:.2}");
    out.push_str("- Credit Card Debt:\n");
    for debt in debts {
        let _ = writeln!(
            out,
            "- {}: ${:.2} at {}% APR",
            debt.name, debt.amount, debt.apr
        );
    }
    let _ = writeln!(out, "\nThe user's question is: \"{}\"\n", question.trim());
    out.push_str(ADVICE_INSTRUCTIONS);
    out
}

pub fn build_budget_plan_prompt(income: f64, items: &[ExpenseLine]) -> String {
    let total: f64 = items.iter().map(|item| item.amount).sum();
    let mut out = String::new();
    out.push_str(
        "You are an expert budget planner. Based on the following financial data, create a sample monthly budget plan.\n\n",
    );
    let _ = writeln!(out, "- Monthly Income: ${income:.2}");
    out.push_str("- Current Monthly Expenses:\n");
    for item in items {
        let _ = writeln!(
            out,
            "- {} - {}: ${:.2}",
            item.category, item.name, item.amount
        );
    }
    let _ = writeln!(out, "- Total Current Monthly Expenses: ${total:.2}\n");
    out.push_str(PLAN_INSTRUCTIONS);
    out
}

const ADVICE_INSTRUCTIONS: &str = "\
Based on this information, provide clear, actionable, and personalized advice on how to lower their debt.
Explain concepts like debt avalanche or debt snowball if they are relevant.
Keep the tone encouraging and supportive. Format your response using markdown.
";

const PLAN_INSTRUCTIONS: &str = "\
Analyze the spending and suggest a realistic budget plan using the 50/30/20 rule (50% Needs, 30% Wants, 20% Savings/Debt) as a guideline, but adapt it to the user's specific income and expenses.

Present the suggested budget in a clear table format using markdown.

Also provide 3-5 actionable tips for them to stick to this new budget.
";

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        return anyhow!("request to {base_url} timed out ({error})");
    }
    anyhow!(
        "cannot reach {} -- check your network connection ({})",
        base_url,
        error
    )
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body)
        && let Some(error) = parsed.error
        && !error.message.is_empty()
    {
        return anyhow!("server error ({}): {}", status.as_u16(), error.message);
    }

    if body.len() < 100 && !body.contains('{') && !body.trim().is_empty() {
        return anyhow!("server error ({}): {}", status.as_u16(), body.trim());
    }

    anyhow!("server returned {}", status.as_u16())
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

impl<'a> GenerateRequest<'a> {
    fn user(prompt: &'a str) -> Self {
        Self {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
        }
    }
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

impl GenerateResponse {
    fn into_text(self) -> Result<String> {
        let Some(candidate) = self.candidates.into_iter().next() else {
            let reason = self
                .prompt_feedback
                .and_then(|feedback| feedback.block_reason)
                .unwrap_or_else(|| "unknown".to_owned());
            bail!("no candidates in generation response (block reason: {reason})");
        };

        let text = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .unwrap_or_default();
        if text.trim().is_empty() {
            let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".to_owned());
            bail!("generation response has no text (finish reason: {reason})");
        }
        Ok(text)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::{
        Client, DebtLine, ExpenseLine, GenerateRequest, GenerateResponse, Generation,
        build_budget_plan_prompt, build_debt_advice_prompt, clean_error_response,
    };
    use anyhow::Result;
    use reqwest::StatusCode;
    use std::time::Duration;

    fn visa() -> DebtLine {
        DebtLine {
            name: "Visa Card".to_owned(),
            amount: 4500.0,
            apr: 22.5,
        }
    }

    #[test]
    fn advice_prompt_lists_each_debt_with_rate() {
        let prompt = build_debt_advice_prompt(5000.0, 1960.0, &[visa()], "How do I start?");
        assert!(prompt.contains("- Monthly Income: $5000.00\n"));
        assert!(prompt.contains("- Total Monthly Expenses: $1960.00\n"));
        assert!(prompt.contains("Visa Card: $4500.00 at 22.5% APR"));
        assert!(prompt.contains("The user's question is: \"How do I start?\""));
        assert!(prompt.contains("debt avalanche or debt snowball"));
    }

    #[test]
    fn advice_prompt_prints_whole_rates_without_decimals() {
        let debt = DebtLine {
            apr: 20.0,
            ..visa()
        };
        let prompt = build_debt_advice_prompt(0.0, 0.0, &[debt], "q");
        assert!(prompt.contains("at 20% APR"));
    }

    #[test]
    fn plan_prompt_lists_items_and_total() {
        let items = [
            ExpenseLine {
                category: "Food".to_owned(),
                name: "Groceries".to_owned(),
                amount: 400.0,
            },
            ExpenseLine {
                category: "Housing".to_owned(),
                name: "Rent".to_owned(),
                amount: 1500.0,
            },
        ];
        let prompt = build_budget_plan_prompt(5000.0, &items);
        assert!(prompt.contains("- Food - Groceries: $400.00\n- Housing - Rent: $1500.00\n"));
        assert!(prompt.contains("- Total Current Monthly Expenses: $1900.00"));
        assert!(prompt.contains("50/30/20 rule"));
        assert!(prompt.contains("3-5 actionable tips"));
    }

    #[test]
    fn plan_prompt_handles_no_items() {
        let prompt = build_budget_plan_prompt(0.0, &[]);
        assert!(prompt.contains(
            "- Current Monthly Expenses:\n- Total Current Monthly Expenses: $0.00\n"
        ));
    }

    #[test]
    fn advice_prompt_without_debts_goes_straight_to_question() {
        let prompt = build_debt_advice_prompt(3000.0, 1200.0, &[], "where do I start?");
        assert!(
            prompt.contains("- Credit Card Debt:\n\nThe user's question is: \"where do I start?\"")
        );
    }

    #[test]
    fn request_body_uses_user_content_parts() -> Result<()> {
        let encoded = serde_json::to_string(&GenerateRequest::user("hello"))?;
        assert_eq!(
            encoded,
            r#"{"contents":[{"role":"user","parts":[{"text":"hello"}]}]}"#
        );
        Ok(())
    }

    #[test]
    fn response_text_joins_parts_of_first_candidate() -> Result<()> {
        let parsed: GenerateResponse = serde_json::from_str(
            r###"{"candidates":[{"content":{"parts":[{"text":"## Plan"},{"text":"\n- a"}]},"finishReason":"STOP"},{"content":{"parts":[{"text":"ignored"}]}}]}"###,
        )?;
        assert_eq!(parsed.into_text()?, "## Plan\n- a");
        Ok(())
    }

    #[test]
    fn blocked_prompt_reports_reason() -> Result<()> {
        let parsed: GenerateResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#)?;
        let error = parsed.into_text().expect_err("blocked prompt should fail");
        assert!(error.to_string().contains("SAFETY"));
        Ok(())
    }

    #[test]
    fn empty_candidate_text_is_an_error() -> Result<()> {
        let parsed: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[]},"finishReason":"MAX_TOKENS"}]}"#,
        )?;
        let error = parsed.into_text().expect_err("empty text should fail");
        assert!(error.to_string().contains("MAX_TOKENS"));
        Ok(())
    }

    #[test]
    fn clean_error_prefers_envelope_message() {
        let error = clean_error_response(
            StatusCode::BAD_REQUEST,
            r#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#,
        );
        assert_eq!(error.to_string(), "server error (400): API key not valid");

        let error = clean_error_response(StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(error.to_string(), "server error (502): upstream down");

        let error = clean_error_response(StatusCode::INTERNAL_SERVER_ERROR, "{not json");
        assert_eq!(error.to_string(), "server returned 500");
    }

    #[test]
    fn new_rejects_bad_settings() {
        let timeout = Duration::from_secs(1);
        assert!(Client::new("", "m", "k", timeout).is_err());
        assert!(Client::new("not a url", "m", "k", timeout).is_err());
        assert!(Client::new("ftp://example.com", "m", "k", timeout).is_err());
        assert!(Client::new("http://example.com", " ", "k", timeout).is_err());
        assert!(Client::new("http://example.com", "m", "", timeout).is_err());
    }

    #[test]
    fn endpoint_joins_model_path() -> Result<()> {
        let client = Client::new(
            "https://generativelanguage.googleapis.com/v1beta/",
            "gemini-2.5-flash",
            "key",
            Duration::from_secs(5),
        )?;
        assert_eq!(
            client.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
        Ok(())
    }

    #[test]
    fn generation_text_reads_either_variant() {
        assert_eq!(Generation::Text("ok".to_owned()).text(), "ok");
        assert!(Generation::Apology("sorry").is_apology());
    }
}
