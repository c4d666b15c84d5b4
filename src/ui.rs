use crate::{
    block_feed::BlockCard,
    model::WagerKind,
    view::{
        Panel,
        Tone,
        ViewModel,
    },
    wager::WagerForm,
};
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use crossterm::{
    event::{
        self,
        Event,
        KeyCode,
        KeyEvent,
        KeyEventKind,
        KeyModifiers,
    },
    terminal::{
        disable_raw_mode,
        enable_raw_mode,
    },
};
use ratatui::{
    prelude::*,
    widgets::*,
};
use std::io::stdout;
use tokio::sync::mpsc;

#[derive(Debug, PartialEq)]
pub enum UserEvent {
    Quit,
    Redraw,
    CreateWallet,
    RefreshBlocks,
    SubmitWager(WagerForm),
    DismissPrompt,
}

pub type InputEventReceiver = mpsc::UnboundedReceiver<std::io::Result<Event>>;

#[derive(Debug)]
pub struct UiState {
    mode: Mode,
    service_url: String,
    feed_scroll: u16,
    terminal: Option<Terminal<CrosstermBackend<std::io::Stdout>>>,
}

impl UiState {
    pub fn new(service_url: impl Into<String>) -> Self {
        UiState {
            mode: Mode::Normal,
            service_url: service_url.into(),
            feed_scroll: 0,
            terminal: None,
        }
    }
}

#[derive(Clone, Debug, Default)]
enum Mode {
    #[default]
    Normal,
    WagerModal(WagerState),
    QuitModal,
}

#[derive(Clone, Debug)]
struct WagerState {
    kind: WagerKind,
    amount: String,
    guess: String,
    focus: Field,
}

impl WagerState {
    fn new(kind: WagerKind) -> Self {
        WagerState {
            kind,
            amount: String::new(),
            guess: String::new(),
            focus: if kind.takes_guess() {
                Field::Guess
            } else {
                Field::Amount
            },
        }
    }

    fn focused(&mut self) -> &mut String {
        match self.focus {
            Field::Amount => &mut self.amount,
            Field::Guess => &mut self.guess,
        }
    }

    fn into_form(self) -> WagerForm {
        let form = WagerForm::new(self.kind, self.amount);
        if self.kind.takes_guess() {
            form.with_guess(self.guess)
        } else {
            form
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Field {
    Amount,
    Guess,
}

pub fn terminal_enter(state: &mut UiState) -> Result<()> {
    enable_raw_mode()?;
    crossterm::execute!(std::io::stdout(), crossterm::terminal::EnterAlternateScreen)?;
    // one persistent Terminal keeps the diff buffers across draws
    let backend = CrosstermBackend::new(stdout());
    let terminal = Terminal::new(backend)?;
    state.terminal = Some(terminal);
    Ok(())
}

pub fn terminal_exit() -> Result<()> {
    disable_raw_mode()?;
    crossterm::execute!(std::io::stdout(), crossterm::terminal::LeaveAlternateScreen)?;
    Ok(())
}

pub fn draw(state: &mut UiState, model: &ViewModel) -> Result<()> {
    if let Some(mut term) = state.terminal.take() {
        let res = term.draw(|f| ui(f, state, model)).map(|_| ());
        state.terminal = Some(term);
        res?;
    }
    Ok(())
}

/// Terminal input is read on a plain thread since `event::read` blocks.
pub fn input_event_stream() -> InputEventReceiver {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        loop {
            let event = event::read();
            let failed = event.is_err();
            if tx.send(event).is_err() || failed {
                break;
            }
        }
    });
    rx
}

pub async fn next_raw_event(input_events: &mut InputEventReceiver) -> Result<Event> {
    let event = input_events
        .recv()
        .await
        .ok_or_else(|| eyre!("terminal input stream closed"))?;
    event.wrap_err("reading terminal input failed")
}

/// Maps a raw terminal event to an action. `prompt_open` is true while a
/// validation notice waits to be dismissed; it swallows every other key.
pub fn interpret_event(
    state: &mut UiState,
    event: Event,
    prompt_open: bool,
) -> Option<UserEvent> {
    let k = match event {
        Event::Key(k) if k.kind == KeyEventKind::Press => k,
        Event::Resize(_, _) => return Some(UserEvent::Redraw),
        _ => return None,
    };
    if is_interrupt(&k) {
        return Some(UserEvent::Quit);
    }
    if prompt_open {
        return match k.code {
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') => {
                Some(UserEvent::DismissPrompt)
            }
            _ => None,
        };
    }

    match &mut state.mode {
        Mode::WagerModal(ws) => {
            return match k.code {
                KeyCode::Esc => {
                    state.mode = Mode::Normal;
                    Some(UserEvent::Redraw)
                }
                KeyCode::Enter => {
                    let ws = ws.clone();
                    state.mode = Mode::Normal;
                    Some(UserEvent::SubmitWager(ws.into_form()))
                }
                KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                    if ws.kind.takes_guess() {
                        ws.focus = match ws.focus {
                            Field::Amount => Field::Guess,
                            Field::Guess => Field::Amount,
                        };
                    }
                    Some(UserEvent::Redraw)
                }
                KeyCode::Backspace => {
                    ws.focused().pop();
                    Some(UserEvent::Redraw)
                }
                KeyCode::Char(c) if !c.is_control() => {
                    ws.focused().push(c);
                    Some(UserEvent::Redraw)
                }
                _ => None,
            };
        }
        Mode::QuitModal => {
            return match k.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => Some(UserEvent::Quit),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    state.mode = Mode::Normal;
                    Some(UserEvent::Redraw)
                }
                _ => None,
            };
        }
        Mode::Normal => {}
    }

    Some(match k.code {
        KeyCode::Char('q') | KeyCode::Esc => {
            state.mode = Mode::QuitModal;
            UserEvent::Redraw
        }
        KeyCode::Char('w') => UserEvent::CreateWallet,
        KeyCode::Char('r') => UserEvent::RefreshBlocks,
        KeyCode::Char('c') => open_wager(state, WagerKind::CoinFlip),
        KeyCode::Char('d') => open_wager(state, WagerKind::DiceRoll),
        KeyCode::Char('n') => open_wager(state, WagerKind::NumberGuess),
        KeyCode::Up | KeyCode::Char('k') => {
            state.feed_scroll = state.feed_scroll.saturating_sub(1);
            UserEvent::Redraw
        }
        KeyCode::Down | KeyCode::Char('j') => {
            state.feed_scroll = state.feed_scroll.saturating_add(1);
            UserEvent::Redraw
        }
        KeyCode::Home => {
            state.feed_scroll = 0;
            UserEvent::Redraw
        }
        _ => return None,
    })
}

fn is_interrupt(k: &KeyEvent) -> bool {
    k.modifiers.contains(KeyModifiers::CONTROL) && k.code == KeyCode::Char('c')
}

fn open_wager(state: &mut UiState, kind: WagerKind) -> UserEvent {
    state.mode = Mode::WagerModal(WagerState::new(kind));
    UserEvent::Redraw
}

fn ui(f: &mut Frame, state: &UiState, model: &ViewModel) {
    f.render_widget(Clear, f.area());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),  // title
            Constraint::Min(12),    // wallet/games + blocks
            Constraint::Length(9),  // activity
            Constraint::Length(3),  // help
        ])
        .split(f.area());

    draw_top(f, chunks[0], state);
    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[1]);
    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(5)])
        .split(middle[0]);
    draw_wallet_panel(f, left[0], model);
    draw_games_panel(f, left[1], model);
    draw_blocks(f, middle[1], state, model);
    draw_activity(f, chunks[2], model);
    draw_help(f, chunks[3]);
    draw_modals(f, state, model);
}

fn draw_top(f: &mut Frame, area: Rect, state: &UiState) {
    let title = Line::from(vec![
        Span::styled("Ledger Wager", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!("  service: {}", state.service_url)),
    ]);
    let p = Paragraph::new(title).block(Block::default().borders(Borders::ALL));
    f.render_widget(p, area);
}

fn draw_wallet_panel(f: &mut Frame, area: Rect, model: &ViewModel) {
    let mut lines = Vec::new();
    match model.panel(Panel::WalletAddress) {
        Some(address) => lines.push(Line::from(vec![
            Span::raw("Address: "),
            Span::styled(address.value.clone(), tone_style(address.tone)),
        ])),
        None => lines.push(Line::styled(
            "No wallet yet, press w to create one",
            Style::default().fg(Color::DarkGray),
        )),
    }
    if let Some(message) = model.panel(Panel::WalletMessage) {
        lines.push(Line::styled(message.value.clone(), tone_style(message.tone)));
    }
    // hidden until the first balance refresh lands
    if let Some(balance) = model.panel(Panel::Balance) {
        lines.push(Line::from(vec![
            Span::raw("Balance: "),
            Span::styled(
                balance.value.clone(),
                tone_style(balance.tone).add_modifier(Modifier::BOLD),
            ),
        ]));
    }
    let block = Block::default().borders(Borders::ALL).title("Wallet");
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }).block(block), area);
}

fn draw_games_panel(f: &mut Frame, area: Rect, model: &ViewModel) {
    let mut lines = Vec::new();
    for kind in WagerKind::ALL {
        lines.push(Line::from(Span::styled(
            format!("[{}] {}", wager_key(kind), kind),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        match model.panel(Panel::Game(kind)) {
            Some(result) => {
                lines.push(Line::styled(format!("  {}", result.value), tone_style(result.tone)))
            }
            None => lines.push(Line::styled("  -", Style::default().fg(Color::DarkGray))),
        }
    }
    let block = Block::default().borders(Borders::ALL).title("Games");
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }).block(block), area);
}

fn draw_blocks(f: &mut Frame, area: Rect, state: &UiState, model: &ViewModel) {
    let (title, lines) = match &model.feed {
        None => (
            "Blocks".to_string(),
            vec![Line::styled(
                "Loading blocks...",
                Style::default().fg(Color::DarkGray),
            )],
        ),
        Some(feed) => {
            let mut lines = Vec::new();
            for card in feed.cards() {
                lines.extend(render_block_card(card));
            }
            if lines.is_empty() {
                lines.push(Line::from("No blocks yet"));
            }
            (format!("Blocks ({})", feed.len()), lines)
        }
    };
    let block = Block::default().borders(Borders::ALL).title(title);
    let p = Paragraph::new(lines)
        .block(block)
        .scroll((state.feed_scroll, 0));
    f.render_widget(p, area);
}

fn render_block_card(card: &BlockCard) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                format!("Block #{}", card.height),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!(
                "  {} tx  {}",
                card.transaction_count, card.timestamp
            )),
        ]),
        Line::from(format!("  hash:  {}", card.hash)),
        Line::from(format!("  prev:  {}", card.prev_hash)),
        Line::from(format!("  nonce: {}", card.nonce)),
    ];
    for tx in &card.transactions {
        lines.push(Line::styled(
            format!("  {tx}"),
            Style::default().fg(Color::Gray),
        ));
    }
    lines.push(Line::from(""));
    lines
}

fn draw_activity(f: &mut Frame, area: Rect, model: &ViewModel) {
    let items: Vec<ListItem> = model
        .activity
        .iter()
        .map(|entry| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{} ", entry.timestamp),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    format!("{:<16}", entry.game),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::styled(entry.result.clone(), result_style(&entry.result)),
            ]))
        })
        .collect();
    let block = Block::default().borders(Borders::ALL).title("Activity");
    f.render_widget(List::new(items).block(block), area);
}

fn draw_help(f: &mut Frame, area: Rect) {
    let help = "w=create wallet  c=coin flip  d=dice roll  n=number guess  r=refresh blocks  \u{2191}/\u{2193}=scroll  q=quit";
    let block = Block::default().borders(Borders::ALL).title("Help");
    f.render_widget(Paragraph::new(help).block(block), area);
}

fn draw_modals(f: &mut Frame, state: &UiState, model: &ViewModel) {
    match &state.mode {
        Mode::WagerModal(ws) => {
            let area = centered_rect(50, 30, f.area());
            let block = Block::default()
                .borders(Borders::ALL)
                .title(format!("Place {} Wager", ws.kind));
            let mut lines = Vec::new();
            if ws.kind.takes_guess() {
                lines.push(field_line(
                    "Guess (1-100)",
                    &ws.guess,
                    ws.focus == Field::Guess,
                ));
            }
            lines.push(field_line("Amount", &ws.amount, ws.focus == Field::Amount));
            lines.push(Line::from(""));
            if ws.kind.takes_guess() {
                lines.push(Line::from("Enter=submit Tab=switch field Esc=cancel"));
            } else {
                lines.push(Line::from("Enter=submit Esc=cancel"));
            }
            f.render_widget(Clear, area);
            f.render_widget(block.clone(), area);
            f.render_widget(Paragraph::new(lines), block.inner(area));
        }
        Mode::QuitModal => {
            let area = centered_rect(40, 20, f.area());
            let block = Block::default().borders(Borders::ALL).title("Confirm Quit");
            let p = Paragraph::new("Quit the client? (Y/N)");
            f.render_widget(Clear, area);
            f.render_widget(block.clone(), area);
            f.render_widget(p, block.inner(area));
        }
        Mode::Normal => {}
    }

    // validation notices sit above everything else
    if let Some(message) = &model.prompt {
        let area = centered_rect(50, 20, f.area());
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .title("Notice");
        let p = Paragraph::new(vec![
            Line::from(message.clone()),
            Line::from(""),
            Line::styled("Enter=dismiss", Style::default().fg(Color::DarkGray)),
        ])
        .wrap(Wrap { trim: true });
        f.render_widget(Clear, area);
        f.render_widget(block.clone(), area);
        f.render_widget(p, block.inner(area));
    }
}

fn field_line(label: &str, value: &str, focused: bool) -> Line<'static> {
    let cursor = if focused { ">" } else { " " };
    let style = if focused {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    Line::styled(format!("{cursor} {label}: {value}"), style)
}

fn wager_key(kind: WagerKind) -> char {
    match kind {
        WagerKind::CoinFlip => 'c',
        WagerKind::DiceRoll => 'd',
        WagerKind::NumberGuess => 'n',
    }
}

fn tone_style(tone: Tone) -> Style {
    match tone {
        Tone::Neutral => Style::default(),
        Tone::Success => Style::default().fg(Color::Green),
        Tone::Danger => Style::default().fg(Color::Red),
        Tone::Info => Style::default().fg(Color::Cyan),
    }
}

fn result_style(result: &str) -> Style {
    match result {
        "WIN" | "SUCCESS" => tone_style(Tone::Success),
        "LOSS" => tone_style(Tone::Danger),
        _ => tone_style(Tone::Info),
    }
}

fn centered_rect(w_percent: u16, h_percent: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - h_percent) / 2),
            Constraint::Percentage(h_percent),
            Constraint::Percentage((100 - h_percent) / 2),
        ])
        .split(r);

    let vertical = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - w_percent) / 2),
            Constraint::Percentage(w_percent),
            Constraint::Percentage((100 - w_percent) / 2),
        ])
        .split(popup_layout[1]);

    vertical[1]
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(state: &mut UiState, text: &str) {
        for c in text.chars() {
            interpret_event(state, key(KeyCode::Char(c)), false);
        }
    }

    #[test]
    fn interpret_event__coin_flip_modal_submits_typed_amount() {
        // given
        let mut state = UiState::new("http://localhost:6969");
        interpret_event(&mut state, key(KeyCode::Char('c')), false);
        type_text(&mut state, "12");

        // when
        let event = interpret_event(&mut state, key(KeyCode::Enter), false);

        // then
        assert_eq!(
            event,
            Some(UserEvent::SubmitWager(WagerForm::new(WagerKind::CoinFlip, "12")))
        );
        assert!(matches!(state.mode, Mode::Normal));
    }

    #[test]
    fn interpret_event__number_guess_modal_fills_guess_then_amount() {
        // given
        let mut state = UiState::new("http://localhost:6969");
        interpret_event(&mut state, key(KeyCode::Char('n')), false);
        type_text(&mut state, "42");
        interpret_event(&mut state, key(KeyCode::Tab), false);
        type_text(&mut state, "5x");
        interpret_event(&mut state, key(KeyCode::Backspace), false);

        // when
        let event = interpret_event(&mut state, key(KeyCode::Enter), false);

        // then
        assert_eq!(
            event,
            Some(UserEvent::SubmitWager(
                WagerForm::new(WagerKind::NumberGuess, "5").with_guess("42")
            ))
        );
    }

    #[test]
    fn interpret_event__open_prompt_swallows_keys_until_dismissed() {
        let mut state = UiState::new("http://localhost:6969");

        assert_eq!(
            interpret_event(&mut state, key(KeyCode::Char('w')), true),
            None
        );
        assert_eq!(
            interpret_event(&mut state, key(KeyCode::Enter), true),
            Some(UserEvent::DismissPrompt)
        );
    }

    #[test]
    fn interpret_event__quit_asks_for_confirmation() {
        // given
        let mut state = UiState::new("http://localhost:6969");

        // when
        let first = interpret_event(&mut state, key(KeyCode::Char('q')), false);
        let cancelled = interpret_event(&mut state, key(KeyCode::Char('n')), false);
        interpret_event(&mut state, key(KeyCode::Esc), false);
        let confirmed = interpret_event(&mut state, key(KeyCode::Char('y')), false);

        // then
        assert_eq!(first, Some(UserEvent::Redraw));
        assert_eq!(cancelled, Some(UserEvent::Redraw));
        assert_eq!(confirmed, Some(UserEvent::Quit));
    }

    #[test]
    fn interpret_event__ctrl_c_quits_from_anywhere() {
        let mut state = UiState::new("http://localhost:6969");
        interpret_event(&mut state, key(KeyCode::Char('d')), false);

        let event = interpret_event(
            &mut state,
            Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            false,
        );

        assert_eq!(event, Some(UserEvent::Quit));
    }

    #[test]
    fn interpret_event__scroll_stops_at_top() {
        let mut state = UiState::new("http://localhost:6969");

        interpret_event(&mut state, key(KeyCode::Up), false);
        interpret_event(&mut state, key(KeyCode::Down), false);
        interpret_event(&mut state, key(KeyCode::Down), false);

        assert_eq!(state.feed_scroll, 2);
    }

    #[test]
    fn draw__renders_placeholder_and_panels_offscreen() {
        // given
        use crate::view::{
            SharedView,
            ViewPort,
        };
        let view = SharedView::new();
        view.display(Panel::WalletAddress, "w1".to_string(), Tone::Success);
        view.display(Panel::Balance, "100".to_string(), Tone::Neutral);
        let model = view.snapshot();
        let state = UiState::new("http://localhost:6969");
        let mut terminal = Terminal::new(ratatui::backend::TestBackend::new(100, 40)).unwrap();

        // when
        terminal.draw(|f| ui(f, &state, &model)).unwrap();

        // then
        let buffer = terminal.backend().buffer();
        let text: String = buffer.content.iter().map(|cell| cell.symbol()).collect();
        assert!(text.contains("Loading blocks..."));
        assert!(text.contains("Address: w1"));
        assert!(text.contains("Balance: 100"));
    }
}
