// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod markdown;

pub use markdown::{document_lines, text_lines};

use anyhow::{Context, Result, anyhow};
use budgie_app::{
    AdviceRequest, AppCommand, AppEvent, AppState, Chart, EMPTY_CHART_MESSAGE, EMPTY_LIST_MESSAGE,
    LedgerItem, ListEditor, ListKind, Panel, PlanRequest, Reply, RequestPhase, RequestSlot,
    SliceKind, Totals, format_amount, format_currency,
};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tracing::debug;

const SCROLL_STEP: u16 = 5;
const ADVICE_PLACEHOLDER: &str = "e.g., How can I pay off my credit card faster?";

/// Outbound work the UI cannot do itself. `run_*` calls block; the
/// `spawn_*` defaults run them inline and post the reply on the internal
/// channel, so implementations only override them to go off-thread.
pub trait AppRuntime {
    fn run_debt_advice(&mut self, request: &AdviceRequest) -> Reply;
    fn run_budget_plan(&mut self, request: &PlanRequest) -> Reply;

    fn spawn_debt_advice(
        &mut self,
        request_id: u64,
        request: AdviceRequest,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let reply = self.run_debt_advice(&request);
        tx.send(InternalEvent::Advice { request_id, reply })
            .map_err(|_| anyhow!("advice event channel closed"))?;
        Ok(())
    }

    fn spawn_budget_plan(
        &mut self,
        request_id: u64,
        request: PlanRequest,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let reply = self.run_budget_plan(&request);
        tx.send(InternalEvent::Plan { request_id, reply })
            .map_err(|_| anyhow!("plan event channel closed"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
    Advice { request_id: u64, reply: Reply },
    Plan { request_id: u64, reply: Reply },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct ViewData {
    help_visible: bool,
    status_token: u64,
    plan_scroll: u16,
    advice_scroll: u16,
}

pub fn run_app<R: AppRuntime>(state: &mut AppState, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    let (internal_tx, internal_rx) = mpsc::channel();

    let mut result = Ok(());
    loop {
        process_internal_events(state, runtime, &mut view_data, &internal_tx, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(Duration::from_millis(120)).context("poll event")?;
        if has_event {
            match event::read().context("read event")? {
                Event::Key(key) => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::Advice { request_id, reply } => {
                let events = state.dispatch(AppCommand::FinishAdvice { request_id, reply });
                apply_events(state, runtime, view_data, tx, events);
            }
            InternalEvent::Plan { request_id, reply } => {
                let events = state.dispatch(AppCommand::FinishPlan { request_id, reply });
                apply_events(state, runtime, view_data, tx, events);
            }
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(4));
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.dispatch(AppCommand::SetStatus(message.into()));
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn dispatch_and_apply<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    command: AppCommand,
) {
    let events = state.dispatch(command);
    apply_events(state, runtime, view_data, internal_tx, events);
}

fn apply_events<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    events: Vec<AppEvent>,
) {
    for event in events {
        match event {
            AppEvent::AdviceStarted { request_id } => {
                view_data.advice_scroll = 0;
                debug!(request_id, "starting debt advice request");
                let request = state.advice_request();
                if let Err(error) =
                    runtime.spawn_debt_advice(request_id, request, internal_tx.clone())
                {
                    let reply = Reply::Fallback(format!("advice request failed: {error:#}"));
                    let followup = state.dispatch(AppCommand::FinishAdvice { request_id, reply });
                    apply_events(state, runtime, view_data, internal_tx, followup);
                }
            }
            AppEvent::PlanStarted { request_id } => {
                view_data.plan_scroll = 0;
                debug!(request_id, "starting budget plan request");
                let request = state.plan_request();
                if let Err(error) =
                    runtime.spawn_budget_plan(request_id, request, internal_tx.clone())
                {
                    let reply = Reply::Fallback(format!("plan request failed: {error:#}"));
                    let followup = state.dispatch(AppCommand::FinishPlan { request_id, reply });
                    apply_events(state, runtime, view_data, internal_tx, followup);
                }
            }
            AppEvent::AdviceFinished(phase) => {
                let message = if phase == RequestPhase::Succeeded {
                    "advice ready"
                } else {
                    "advice unavailable"
                };
                emit_status(state, view_data, internal_tx, message);
            }
            AppEvent::PlanFinished(phase) => {
                let message = if phase == RequestPhase::Succeeded {
                    "budget plan ready"
                } else {
                    "budget plan unavailable"
                };
                emit_status(state, view_data, internal_tx, message);
            }
            AppEvent::StatusUpdated(_) => {
                view_data.status_token = view_data.status_token.saturating_add(1);
                schedule_status_clear(internal_tx, view_data.status_token);
            }
            AppEvent::FocusChanged(_)
            | AppEvent::IncomeChanged(_)
            | AppEvent::DraftChanged(_)
            | AppEvent::ItemAdded(_)
            | AppEvent::ItemRemoved(_)
            | AppEvent::QuestionChanged
            | AppEvent::ReplyDismissed(_)
            | AppEvent::StatusCleared => {}
        }
    }
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if view_data.help_visible {
        if matches!(key.code, KeyCode::Esc | KeyCode::F(1)) {
            view_data.help_visible = false;
            emit_status(state, view_data, internal_tx, "help hidden");
        }
        return false;
    }

    let command = match (key.code, key.modifiers) {
        (KeyCode::F(1), _) => {
            view_data.help_visible = true;
            return false;
        }
        (KeyCode::PageUp, _) => {
            scroll_focused_response(view_data, state.focus, false);
            return false;
        }
        (KeyCode::PageDown, _) => {
            scroll_focused_response(view_data, state.focus, true);
            return false;
        }
        (KeyCode::Tab, _) => AppCommand::FocusNext,
        (KeyCode::BackTab, _) => AppCommand::FocusPrev,
        (KeyCode::Char('d'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            AppCommand::RemoveSelected
        }
        (KeyCode::Delete, _) => AppCommand::RemoveSelected,
        (KeyCode::Up, _) => AppCommand::SelectPrev,
        (KeyCode::Down, _) => AppCommand::SelectNext,
        (KeyCode::Enter, _) => AppCommand::Submit,
        (KeyCode::Esc, _) => AppCommand::ClearInput,
        (KeyCode::Backspace, _) => AppCommand::DeleteChar,
        (KeyCode::Char(ch), modifiers)
            if !modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            AppCommand::InsertChar(ch)
        }
        _ => return false,
    };

    dispatch_and_apply(state, runtime, view_data, internal_tx, command);
    false
}

fn scroll_focused_response(view_data: &mut ViewData, focus: Panel, down: bool) -> bool {
    let offset = match focus {
        Panel::BudgetPlan => &mut view_data.plan_scroll,
        Panel::DebtAdvice => &mut view_data.advice_scroll,
        Panel::Income | Panel::List(_) => return false,
    };
    *offset = if down {
        offset.saturating_add(SCROLL_STEP)
    } else {
        offset.saturating_sub(SCROLL_STEP)
    };
    true
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Min(12),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let title = Paragraph::new(Line::styled(
        "AI Budget Planner",
        Style::default()
            .fg(Color::Magenta)
            .add_modifier(Modifier::BOLD),
    ))
    .block(Block::default().title("budgie").borders(Borders::ALL));
    frame.render_widget(title, layout[0]);

    render_summary_cards(frame, layout[1], &state.totals());

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(layout[2]);
    render_left_column(frame, columns[0], state);
    render_ai_column(frame, columns[1], state, view_data);

    let status_widget = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status_widget, layout[3]);

    if view_data.help_visible {
        let area = centered_rect(70, 60, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .wrap(Wrap { trim: false })
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_summary_cards(frame: &mut ratatui::Frame<'_>, area: Rect, totals: &Totals) {
    let cells = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(25); 4])
        .split(area);

    for (cell, (label, value, color)) in cells.iter().zip(summary_cards(totals)) {
        let card = Paragraph::new(Line::styled(
            value,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ))
        .block(
            Block::default()
                .title(label)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        frame.render_widget(card, *cell);
    }
}

fn summary_cards(totals: &Totals) -> [(&'static str, String, Color); 4] {
    let savings_color = if totals.savings >= 0.0 {
        Color::Blue
    } else {
        Color::Red
    };
    [
        (
            "Monthly Income",
            format_currency(totals.income),
            Color::Green,
        ),
        (
            "Monthly Expenses",
            format_currency(totals.total_expenses),
            Color::Red,
        ),
        (
            "Total Debt",
            format_currency(totals.total_debt),
            Color::Yellow,
        ),
        (
            "Monthly Savings",
            format_currency(totals.savings),
            savings_color,
        ),
    ]
}

fn render_left_column(frame: &mut ratatui::Frame<'_>, area: Rect, state: &AppState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6),
            Constraint::Length(3),
            Constraint::Min(4),
            Constraint::Min(4),
            Constraint::Min(4),
        ])
        .split(area);

    let chart_width = rows[0].width.saturating_sub(2);
    let chart = Paragraph::new(chart_lines(&state.chart(), chart_width))
        .block(panel_block("Financial Overview", false));
    frame.render_widget(chart, rows[0]);

    let income_focused = state.focus == Panel::Income;
    let income = Paragraph::new(income_line(state, income_focused))
        .block(panel_block("Income", income_focused));
    frame.render_widget(income, rows[1]);

    render_list(frame, rows[2], ListKind::Debts, &state.debts, state.focus);
    render_list(frame, rows[3], ListKind::Bills, &state.bills, state.focus);
    render_list(frame, rows[4], ListKind::Expenses, &state.expenses, state.focus);
}

fn render_list<T: LedgerItem>(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    kind: ListKind,
    editor: &ListEditor<T>,
    focus: Panel,
) {
    let focused = focus == Panel::List(kind);
    let title = format!("{} ({})", kind.title(), format_currency(editor.total()));
    let lines = list_lines(editor, focused);

    // Keep the draft row and the selection on screen in short panels.
    let visible = usize::from(area.height.saturating_sub(2));
    let skip = if lines.len() > visible && focused {
        (editor.selected_index() + 2)
            .saturating_sub(visible)
            .min(lines.len() - visible)
    } else {
        0
    };
    let widget = Paragraph::new(lines).scroll((skip as u16, 0)).block(panel_block(&title, focused));
    frame.render_widget(widget, area);
}

fn render_ai_column(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &AppState,
    view_data: &ViewData,
) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let plan_focused = state.focus == Panel::BudgetPlan;
    let plan = plan_lines(&state.plan);
    let plan_scroll = clamp_scroll(view_data.plan_scroll, plan.len());
    let planner = Paragraph::new(plan)
        .wrap(Wrap { trim: false })
        .scroll((plan_scroll, 0))
        .block(panel_block("AI Budget Planner", plan_focused));
    frame.render_widget(planner, rows[0]);

    let advice_focused = state.focus == Panel::DebtAdvice;
    let advice = advice_lines(state, advice_focused);
    let advice_scroll = clamp_scroll(view_data.advice_scroll, advice.len());
    let advisor = Paragraph::new(advice)
        .wrap(Wrap { trim: false })
        .scroll((advice_scroll, 0))
        .block(panel_block("AI Debt Advisor", advice_focused));
    frame.render_widget(advisor, rows[1]);
}

fn clamp_scroll(offset: u16, line_count: usize) -> u16 {
    let max = u16::try_from(line_count.saturating_sub(1)).unwrap_or(u16::MAX);
    offset.min(max)
}

fn panel_block(title: &str, focused: bool) -> Block<'static> {
    let border = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Block::default()
        .title(title.to_owned())
        .borders(Borders::ALL)
        .border_style(border)
}

fn dim() -> Style {
    Style::default().fg(Color::DarkGray)
}

fn chart_lines(chart: &Chart, width: u16) -> Vec<Line<'static>> {
    let (Some(expenses), Some(savings)) = (
        chart.slice(SliceKind::Expenses),
        chart.slice(SliceKind::Savings),
    ) else {
        return vec![Line::styled(EMPTY_CHART_MESSAGE, dim())];
    };

    let width = usize::from(width.max(1));
    let bar = if expenses.fraction == 0.0 && savings.fraction == 0.0 {
        Line::styled("░".repeat(width), dim())
    } else {
        let expense_cells = ((expenses.fraction * width as f64).round() as usize).min(width);
        Line::from(vec![
            Span::styled("█".repeat(expense_cells), Style::default().fg(Color::Red)),
            Span::styled(
                "█".repeat(width - expense_cells),
                Style::default().fg(Color::Green),
            ),
        ])
    };

    let legend = |slice: &budgie_app::Slice, color: Color| {
        Line::from(vec![
            Span::styled("■ ", Style::default().fg(color)),
            Span::styled(
                slice.percent_label(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("  {}", format_amount(slice.amount))),
        ])
    };

    vec![
        bar,
        Line::default(),
        legend(expenses, Color::Red),
        legend(savings, Color::Green),
    ]
}

fn income_line(state: &AppState, focused: bool) -> Line<'static> {
    let mut spans = vec![Span::styled("$ ", dim())];
    if state.income_input().is_empty() {
        spans.push(Span::styled("0.00", dim()));
    } else {
        spans.push(Span::raw(state.income_input().to_owned()));
    }
    if focused {
        spans.push(Span::styled("▏", Style::default().fg(Color::Cyan)));
    }
    Line::from(spans)
}

fn list_lines<T: LedgerItem>(editor: &ListEditor<T>, focused: bool) -> Vec<Line<'static>> {
    let mut lines = Vec::with_capacity(editor.len() + 1);
    if editor.is_empty() {
        lines.push(Line::styled(EMPTY_LIST_MESSAGE, dim()));
    }
    for (index, item) in editor.items().iter().enumerate() {
        let selected = focused && index == editor.selected_index();
        let (marker, style) = if selected {
            (
                "▸ ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            ("  ", Style::default())
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{marker}{}", item.name()), style),
            Span::raw("  "),
            Span::styled(item.detail(), Style::default().fg(Color::Gray)),
        ]));
    }
    lines.push(draft_line(editor, focused));
    lines
}

fn draft_line<T: LedgerItem>(editor: &ListEditor<T>, focused: bool) -> Line<'static> {
    let mut spans = vec![Span::styled("+ ", Style::default().fg(Color::Green))];
    for (index, field) in editor.fields().iter().enumerate() {
        if index > 0 {
            spans.push(Span::raw(" "));
        }
        let value = editor.draft().value_at(index);
        let (text, mut style) = if value.is_empty() {
            (field.placeholder.to_owned(), dim())
        } else {
            (value.to_owned(), Style::default())
        };
        if focused && index == editor.field_index() {
            style = style.add_modifier(Modifier::UNDERLINED | Modifier::BOLD);
        }
        spans.push(Span::styled(format!("[{text}]"), style));
    }
    Line::from(spans)
}

fn plan_lines(slot: &RequestSlot) -> Vec<Line<'static>> {
    match slot.phase() {
        RequestPhase::Pending { .. } => vec![
            Line::styled(
                "Generating...",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
            Line::styled("Analyzing your finances...", dim()),
        ],
        RequestPhase::Failed => vec![Line::styled(
            slot.response().to_owned(),
            Style::default().fg(Color::Red),
        )],
        RequestPhase::Idle | RequestPhase::Succeeded if slot.response().is_empty() => vec![
            Line::styled(
                "Get a personalized budget plan based on your income and expenses.",
                dim(),
            ),
            Line::styled("press enter to create my budget plan", dim()),
        ],
        RequestPhase::Idle | RequestPhase::Succeeded => text_lines(slot.response()),
    }
}

fn advice_lines(state: &AppState, focused: bool) -> Vec<Line<'static>> {
    let mut question = vec![Span::styled("> ", Style::default().fg(Color::Cyan))];
    if state.advice_query.is_empty() {
        question.push(Span::styled(ADVICE_PLACEHOLDER, dim()));
    } else {
        question.push(Span::raw(state.advice_query.clone()));
    }
    if focused {
        question.push(Span::styled("▏", Style::default().fg(Color::Cyan)));
    }

    let mut lines = vec![Line::from(question), Line::default()];
    match state.advice.phase() {
        RequestPhase::Pending { .. } => {
            lines.push(Line::styled(
                "Thinking...",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ));
            lines.push(Line::styled("Generating personalized advice...", dim()));
        }
        RequestPhase::Failed => lines.push(Line::styled(
            state.advice.response().to_owned(),
            Style::default().fg(Color::Red),
        )),
        RequestPhase::Idle | RequestPhase::Succeeded => {
            lines.extend(text_lines(state.advice.response()));
        }
    }
    lines
}

fn status_text(state: &AppState, view_data: &ViewData) -> String {
    if view_data.help_visible {
        return String::new();
    }

    let focus = state.focus.label().to_uppercase();
    let default = format!(
        "{} | tab focus | f1 help | ctrl+q quit",
        focus_hint(state.focus)
    );
    match &state.status_line {
        Some(status) => format!("{focus} | {status} | {default}"),
        None => format!("{focus} | {default}"),
    }
}

fn focus_hint(focus: Panel) -> &'static str {
    match focus {
        Panel::Income => "type amount",
        Panel::List(_) => "type | enter next/add | up/down | ctrl+d del | esc clear",
        Panel::BudgetPlan => "enter plan | esc dismiss | pgup/pgdn scroll",
        Panel::DebtAdvice => "type question | enter ask | esc clear | pgup/pgdn scroll",
    }
}

fn help_overlay_text() -> &'static str {
    "global: ctrl+q quit | tab/shift+tab focus | f1 help\n\
income: type digits | backspace erase\n\
lists: type to fill the highlighted field | enter next field, add on last | esc clear draft\n\
lists: up/down select | ctrl+d or delete remove selected\n\
planner: enter create plan | esc dismiss finished plan | pgup/pgdn scroll\n\
advisor: type question | enter ask | esc clear question, then dismiss answer | pgup/pgdn scroll\n\
help: esc or f1 close"
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::{
        AppRuntime, InternalEvent, ViewData, chart_lines, handle_key_event, list_lines,
        plan_lines, process_internal_events, render, status_text, summary_cards,
    };
    use anyhow::Result;
    use budgie_app::{
        AdviceRequest, AppState, Chart, Expense, ListEditor, ListKind, Panel, PlanRequest, Reply,
        RequestPhase,
    };
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use ratatui::style::Color;
    use ratatui::text::Line;
    use std::sync::mpsc::{self, Receiver, Sender};

    #[derive(Debug, Default)]
    struct TestRuntime {
        advice_reply: Option<Reply>,
        plan_reply: Option<Reply>,
        advice_requests: Vec<AdviceRequest>,
        plan_requests: Vec<PlanRequest>,
    }

    impl AppRuntime for TestRuntime {
        fn run_debt_advice(&mut self, request: &AdviceRequest) -> Reply {
            self.advice_requests.push(request.clone());
            self.advice_reply
                .clone()
                .unwrap_or_else(|| Reply::Answer("Pay the highest APR first.".to_owned()))
        }

        fn run_budget_plan(&mut self, request: &PlanRequest) -> Reply {
            self.plan_requests.push(request.clone());
            self.plan_reply
                .clone()
                .unwrap_or_else(|| Reply::Answer("## Plan\n- save more".to_owned()))
        }
    }

    /// Never answers, so requests stay pending.
    #[derive(Debug, Default)]
    struct StalledRuntime {
        spawned: usize,
    }

    impl AppRuntime for StalledRuntime {
        fn run_debt_advice(&mut self, _request: &AdviceRequest) -> Reply {
            Reply::Answer(String::new())
        }

        fn run_budget_plan(&mut self, _request: &PlanRequest) -> Reply {
            Reply::Answer(String::new())
        }

        fn spawn_budget_plan(
            &mut self,
            _request_id: u64,
            _request: PlanRequest,
            _tx: Sender<InternalEvent>,
        ) -> Result<()> {
            self.spawned += 1;
            Ok(())
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(ch: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL)
    }

    fn press<R: AppRuntime>(
        state: &mut AppState,
        runtime: &mut R,
        view_data: &mut ViewData,
        tx: &Sender<InternalEvent>,
        event: KeyEvent,
    ) -> bool {
        handle_key_event(state, runtime, view_data, tx, event)
    }

    fn type_text<R: AppRuntime>(
        state: &mut AppState,
        runtime: &mut R,
        view_data: &mut ViewData,
        tx: &Sender<InternalEvent>,
        text: &str,
    ) {
        for ch in text.chars() {
            press(state, runtime, view_data, tx, key(KeyCode::Char(ch)));
        }
    }

    fn internal_channel() -> (Sender<InternalEvent>, Receiver<InternalEvent>) {
        mpsc::channel()
    }

    fn plain(lines: &[Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|line| line.spans.iter().map(|span| span.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn ctrl_q_quits() {
        let mut state = AppState::default();
        let mut runtime = TestRuntime::default();
        let mut view_data = ViewData::default();
        let (tx, _rx) = internal_channel();
        assert!(press(&mut state, &mut runtime, &mut view_data, &tx, ctrl('q')));
        assert!(!press(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            key(KeyCode::Char('q'))
        ));
    }

    #[test]
    fn tab_and_backtab_cycle_focus() {
        let mut state = AppState::default();
        let mut runtime = TestRuntime::default();
        let mut view_data = ViewData::default();
        let (tx, _rx) = internal_channel();

        press(&mut state, &mut runtime, &mut view_data, &tx, key(KeyCode::Tab));
        assert_eq!(state.focus, Panel::List(ListKind::Debts));
        press(&mut state, &mut runtime, &mut view_data, &tx, key(KeyCode::BackTab));
        press(&mut state, &mut runtime, &mut view_data, &tx, key(KeyCode::BackTab));
        assert_eq!(state.focus, Panel::DebtAdvice);
    }

    #[test]
    fn typing_income_updates_savings_card() {
        let mut state = AppState::default();
        let mut runtime = TestRuntime::default();
        let mut view_data = ViewData::default();
        let (tx, _rx) = internal_channel();

        type_text(&mut state, &mut runtime, &mut view_data, &tx, "2500");
        let cards = summary_cards(&state.totals());
        assert_eq!(cards[0].1, "$2,500.00");
        assert_eq!(cards[3].1, "$2,500.00");
        assert_eq!(cards[3].2, Color::Blue);
    }

    #[test]
    fn negative_savings_card_turns_red() {
        let mut state = AppState::sample();
        state.dispatch(budgie_app::AppCommand::SetIncome("100".to_owned()));
        let cards = summary_cards(&state.totals());
        assert_eq!(cards[3].1, "-$2,010.00");
        assert_eq!(cards[3].2, Color::Red);
    }

    #[test]
    fn keys_add_and_remove_an_expense() {
        let mut state = AppState::default();
        state.focus = Panel::List(ListKind::Expenses);
        let mut runtime = TestRuntime::default();
        let mut view_data = ViewData::default();
        let (tx, _rx) = internal_channel();

        type_text(&mut state, &mut runtime, &mut view_data, &tx, "Gym");
        press(&mut state, &mut runtime, &mut view_data, &tx, key(KeyCode::Enter));
        type_text(&mut state, &mut runtime, &mut view_data, &tx, "45");
        press(&mut state, &mut runtime, &mut view_data, &tx, key(KeyCode::Enter));
        type_text(&mut state, &mut runtime, &mut view_data, &tx, "Health");
        press(&mut state, &mut runtime, &mut view_data, &tx, key(KeyCode::Enter));

        assert_eq!(state.expenses.len(), 1);
        assert_eq!(state.expenses.items()[0].category, "Health");
        assert_eq!(state.status_line.as_deref(), Some("expense added"));
        assert!(view_data.status_token > 0);

        press(&mut state, &mut runtime, &mut view_data, &tx, ctrl('d'));
        assert!(state.expenses.is_empty());
    }

    #[test]
    fn enter_in_planner_delivers_plan_through_channel() {
        let mut state = AppState::sample();
        state.focus = Panel::BudgetPlan;
        let mut runtime = TestRuntime::default();
        let mut view_data = ViewData::default();
        let (tx, rx) = internal_channel();

        press(&mut state, &mut runtime, &mut view_data, &tx, key(KeyCode::Enter));
        assert!(state.plan.is_busy());
        assert_eq!(runtime.plan_requests.len(), 1);
        assert_eq!(runtime.plan_requests[0].items.len(), 4);

        process_internal_events(&mut state, &mut runtime, &mut view_data, &tx, &rx);
        assert_eq!(state.plan.phase(), RequestPhase::Succeeded);
        assert_eq!(state.plan.response(), "## Plan\n- save more");
        assert_eq!(state.status_line.as_deref(), Some("budget plan ready"));
        assert_eq!(
            plain(&plan_lines(&state.plan)),
            vec!["Plan".to_owned(), "  • save more".to_owned()]
        );
    }

    #[test]
    fn advice_fallback_settles_as_failed() {
        let mut state = AppState::sample();
        state.focus = Panel::DebtAdvice;
        let mut runtime = TestRuntime {
            advice_reply: Some(Reply::Fallback("I'm sorry".to_owned())),
            ..TestRuntime::default()
        };
        let mut view_data = ViewData::default();
        let (tx, rx) = internal_channel();

        type_text(&mut state, &mut runtime, &mut view_data, &tx, "help?");
        press(&mut state, &mut runtime, &mut view_data, &tx, key(KeyCode::Enter));
        process_internal_events(&mut state, &mut runtime, &mut view_data, &tx, &rx);

        assert_eq!(runtime.advice_requests[0].question, "help?");
        assert_eq!(state.advice.phase(), RequestPhase::Failed);
        assert!(!state.advice.is_busy());
        assert_eq!(state.advice.response(), "I'm sorry");
        assert_eq!(state.status_line.as_deref(), Some("advice unavailable"));
    }

    #[test]
    fn pending_plan_shows_progress_and_ignores_trigger() {
        let mut state = AppState::sample();
        state.focus = Panel::BudgetPlan;
        let mut runtime = StalledRuntime::default();
        let mut view_data = ViewData::default();
        let (tx, _rx) = internal_channel();

        press(&mut state, &mut runtime, &mut view_data, &tx, key(KeyCode::Enter));
        press(&mut state, &mut runtime, &mut view_data, &tx, key(KeyCode::Enter));
        assert_eq!(runtime.spawned, 1);
        assert_eq!(plain(&plan_lines(&state.plan))[0], "Generating...");
    }

    #[test]
    fn stale_status_clear_is_ignored() {
        let mut state = AppState::default();
        let mut runtime = TestRuntime::default();
        let mut view_data = ViewData {
            status_token: 2,
            ..ViewData::default()
        };
        let (tx, rx) = internal_channel();
        state.status_line = Some("keep".to_owned());

        tx.send(InternalEvent::ClearStatus { token: 1 })
            .expect("send stale clear");
        process_internal_events(&mut state, &mut runtime, &mut view_data, &tx, &rx);
        assert_eq!(state.status_line.as_deref(), Some("keep"));

        tx.send(InternalEvent::ClearStatus { token: 2 })
            .expect("send current clear");
        process_internal_events(&mut state, &mut runtime, &mut view_data, &tx, &rx);
        assert_eq!(state.status_line, None);
    }

    #[test]
    fn f1_toggles_help_and_hides_status_bar() {
        let mut state = AppState::default();
        let mut runtime = TestRuntime::default();
        let mut view_data = ViewData::default();
        let (tx, _rx) = internal_channel();

        press(&mut state, &mut runtime, &mut view_data, &tx, key(KeyCode::F(1)));
        assert!(view_data.help_visible);
        assert_eq!(status_text(&state, &view_data), "");

        press(&mut state, &mut runtime, &mut view_data, &tx, key(KeyCode::Char('x')));
        assert_eq!(state.income_input(), "");

        press(&mut state, &mut runtime, &mut view_data, &tx, key(KeyCode::Esc));
        assert!(!view_data.help_visible);
        assert!(status_text(&state, &view_data).starts_with("INCOME | help hidden"));
    }

    #[test]
    fn page_keys_scroll_only_ai_panels() {
        let mut state = AppState::default();
        let mut runtime = TestRuntime::default();
        let mut view_data = ViewData::default();
        let (tx, _rx) = internal_channel();

        press(&mut state, &mut runtime, &mut view_data, &tx, key(KeyCode::PageDown));
        assert_eq!(view_data, ViewData::default());

        state.focus = Panel::DebtAdvice;
        press(&mut state, &mut runtime, &mut view_data, &tx, key(KeyCode::PageDown));
        press(&mut state, &mut runtime, &mut view_data, &tx, key(KeyCode::PageDown));
        press(&mut state, &mut runtime, &mut view_data, &tx, key(KeyCode::PageUp));
        assert_eq!(view_data.advice_scroll, 5);
        assert_eq!(view_data.plan_scroll, 0);
    }

    #[test]
    fn chart_bar_splits_width_by_fraction() {
        let lines = chart_lines(&Chart::from_budget(5000.0, 1960.0), 100);
        assert_eq!(lines[0].spans[0].content.chars().count(), 39);
        assert_eq!(lines[0].spans[1].content.chars().count(), 61);
        let text = plain(&lines);
        assert_eq!(text[2], "■ Expenses 39%  $1960.00");
        assert_eq!(text[3], "■ Savings 61%  $3040.00");
    }

    #[test]
    fn empty_chart_shows_prompt() {
        let text = plain(&chart_lines(&Chart::Empty, 40));
        assert_eq!(
            text,
            vec!["Enter your income and expenses to see the chart.".to_owned()]
        );
    }

    #[test]
    fn empty_list_shows_message_and_draft_placeholders() {
        let editor = ListEditor::<Expense>::default();
        let text = plain(&list_lines(&editor, true));
        assert_eq!(
            text,
            vec![
                "No items added yet.".to_owned(),
                "+ [Expense Name] [Amount] [Category]".to_owned(),
            ]
        );
    }

    #[test]
    fn full_frame_renders_cards_lists_and_panels() -> Result<()> {
        let state = AppState::sample();
        let view_data = ViewData::default();
        let mut terminal = Terminal::new(TestBackend::new(140, 48))?;
        terminal.draw(|frame| render(frame, &state, &view_data))?;

        let screen = terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect::<String>();
        for needle in [
            "Monthly Income",
            "$5,000.00",
            "Monthly Savings",
            "Visa Card",
            "$4500.00 at 22.5%",
            "Recurring Bills",
            "AI Budget Planner",
            "AI Debt Advisor",
        ] {
            assert!(screen.contains(needle), "missing {needle:?}");
        }
        Ok(())
    }
}
