//! Antibiotic Recommendation Engine Demo — interactive Ratatui TUI
//!
//! Layout:
//!   ┌─── header ──────────────────────────────────────────────────────────┐
//!   │  [1] Febrile UTI  [2] Intra-abd/allergy  [3] Pregnant UTI  ...       │
//!   ├─── left panel ───────────────────┬─── right panel ──────────────────┤
//!   │  Pipeline                        │  Recommendation                  │
//!   ├───────────────────────────────────┴───────────────────────────────────┤
//!   │  footer (key bindings)                                               │
//!   └───────────────────────────────────────────────────────────────────────┘

use std::{
    io,
    time::{Duration, Instant},
};

use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame, Terminal,
};

use abx_contracts::patient::{PatientCase, PatientCaseBuilder};
use abx_engine::RecommendationEngine;
use abx_repository::GuidelineRepository;

// ── Domain types ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scenario {
    FebrileUti,
    IntraAbdominalAllergy,
    PregnantUti,
    MrsaBacteremia,
    Meningitis,
    AfebrileUti,
}

const SCENARIOS: [Scenario; 6] = [
    Scenario::FebrileUti,
    Scenario::IntraAbdominalAllergy,
    Scenario::PregnantUti,
    Scenario::MrsaBacteremia,
    Scenario::Meningitis,
    Scenario::AfebrileUti,
];

impl Scenario {
    fn label(self) -> &'static str {
        match self {
            Scenario::FebrileUti => "Febrile UTI",
            Scenario::IntraAbdominalAllergy => "Intra-abd, PCN allergy",
            Scenario::PregnantUti => "Pregnant UTI, PCN allergy",
            Scenario::MrsaBacteremia => "MRSA bacteremia, renal impairment",
            Scenario::Meningitis => "Bacterial meningitis",
            Scenario::AfebrileUti => "Afebrile UTI",
        }
    }

    fn case(self) -> PatientCase {
        match self {
            Scenario::FebrileUti => PatientCaseBuilder::new(55, "uti").fever(true).build(),
            Scenario::IntraAbdominalAllergy => {
                PatientCaseBuilder::new(65, "intra_abdominal").allergies("Penicillin - anaphylaxis").build()
            }
            Scenario::PregnantUti => {
                PatientCaseBuilder::new(28, "uti").fever(true).pregnancy(2).allergies("PCN (anaphylaxis)").build()
            }
            Scenario::MrsaBacteremia => {
                PatientCaseBuilder::new(75, "bacteremia").mrsa_risk(true).weight_kg(80.0).crcl_ml_min(25.0).build()
            }
            Scenario::Meningitis => PatientCaseBuilder::new(42, "meningitis").weight_kg(70.0).build(),
            Scenario::AfebrileUti => PatientCaseBuilder::new(45, "uti").fever(false).build(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum StepStatus {
    Pass,
    Warn,
    Fail,
}

#[derive(Debug, Clone)]
struct PipelineStep {
    name: String,
    status: StepStatus,
    detail: String,
}

// ── App state ─────────────────────────────────────────────────────────────────

struct App {
    selected: Scenario,
    repository: GuidelineRepository,

    pipeline_steps: Vec<PipelineStep>,
    recommendation_text: Option<String>,

    animation_step: usize,
    last_tick: Instant,
    animating: bool,
}

impl App {
    fn new(repository: GuidelineRepository) -> Self {
        Self {
            selected: Scenario::FebrileUti,
            repository,
            pipeline_steps: Vec::new(),
            recommendation_text: None,
            animation_step: 0,
            last_tick: Instant::now(),
            animating: false,
        }
    }

    fn tick_animation(&mut self) {
        if self.animating && self.animation_step < self.pipeline_steps.len() {
            self.animation_step += 1;
            if self.animation_step >= self.pipeline_steps.len() {
                self.animating = false;
            }
        }
    }

    /// Run the selected scenario through the allergy classifier, pregnancy
    /// filter, drug selector, and dose calculator individually, then the
    /// full recommendation engine for the final rendered text.
    fn run(&mut self) {
        let case = self.selected.case();

        let allergy = abx_rules::allergy::classify_allergy(&self.repository, &case.allergies);
        let pregnancy_excluded = abx_rules::pregnancy::excluded_drugs(&self.repository, case.pregnancy);
        let (selection, selector_signals) = abx_rules::select_with_signals(&self.repository, &case);
        let (regimen, _dosing_signals) = abx_dosing::calculate_with_signals(
            &self.repository,
            &selection.drug_ids,
            selection.infection_category.as_deref().unwrap_or(&case.infection_type),
            case.crcl_ml_min,
            case.weight_kg,
            Some(case.age),
        );

        self.pipeline_steps = vec![
            PipelineStep {
                name: "Allergy classifier".to_string(),
                status: if matches!(allergy, abx_contracts::recommendation::AllergyClassification::NoAllergy) {
                    StepStatus::Pass
                } else {
                    StepStatus::Warn
                },
                detail: format!("allergies=\"{}\" -> {allergy}", case.allergies),
            },
            PipelineStep {
                name: "Pregnancy filter".to_string(),
                status: if pregnancy_excluded.is_empty() { StepStatus::Pass } else { StepStatus::Warn },
                detail: match case.pregnancy {
                    Some(trimester) => {
                        format!("trimester {trimester}; excluded {} drug(s)", pregnancy_excluded.len())
                    }
                    None => "not pregnant".to_string(),
                },
            },
            PipelineStep {
                name: "Renal adjuster".to_string(),
                status: match case.crcl_ml_min {
                    Some(crcl) if abx_rules::renal::is_severe_impairment(crcl) => StepStatus::Warn,
                    _ => StepStatus::Pass,
                },
                detail: match case.crcl_ml_min {
                    Some(crcl) => format!("CrCl {crcl} mL/min"),
                    None => "CrCl not provided".to_string(),
                },
            },
            PipelineStep {
                name: "Drug selector".to_string(),
                status: if selection.errors.is_empty() { StepStatus::Pass } else { StepStatus::Fail },
                detail: if selection.errors.is_empty() {
                    format!(
                        "category={} route={:?} drugs={:?}{}",
                        selection.infection_category.as_deref().unwrap_or("?"),
                        selection.route,
                        selection.drug_ids,
                        if selector_signals.fell_back_without_subcategory { " (fallback)" } else { "" }
                    )
                } else {
                    selection.errors.join("; ")
                },
            },
            PipelineStep {
                name: "Dose calculator".to_string(),
                status: if regimen.errors.is_empty() && !regimen.drugs.is_empty() { StepStatus::Pass } else { StepStatus::Fail },
                detail: if regimen.drugs.is_empty() {
                    regimen.errors.join("; ")
                } else {
                    regimen
                        .drugs
                        .iter()
                        .map(|d| format!("{} {}", d.drug_name, d.dose.as_deref().unwrap_or("")))
                        .collect::<Vec<_>>()
                        .join(", ")
                },
            },
        ];

        let engine = RecommendationEngine::new(&self.repository);
        let recommendation = engine.recommend(&case);
        self.recommendation_text = recommendation.recommendation_text;

        self.animation_step = 0;
        self.last_tick = Instant::now();
        self.animating = true;
    }
}

// ── UI rendering ──────────────────────────────────────────────────────────────

fn ui(f: &mut Frame, app: &App) {
    let full = f.area();

    let outer_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(10), Constraint::Length(3)])
        .split(full);

    render_header(f, outer_chunks[0], app);

    let mid_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(outer_chunks[1]);

    render_pipeline(f, mid_chunks[0], app);
    render_recommendation(f, mid_chunks[1], app);
    render_footer(f, outer_chunks[2]);
}

fn render_header(f: &mut Frame, area: ratatui::layout::Rect, app: &App) {
    let title_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let mut spans: Vec<Span> = vec![Span::styled("Antibiotic Recommendation Engine    ", title_style)];

    for (i, scenario) in SCENARIOS.iter().enumerate() {
        let is_selected = app.selected == *scenario;
        let style = if is_selected {
            Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        spans.push(Span::styled(format!("[{}] {}  ", i + 1, scenario.label()), style));
    }

    let header = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::DarkGray)));
    f.render_widget(header, area);
}

fn render_pipeline(f: &mut Frame, area: ratatui::layout::Rect, app: &App) {
    let mut items: Vec<ListItem> = Vec::new();

    let state_str = if app.animating {
        "State: running..."
    } else if app.recommendation_text.is_some() {
        "State: complete"
    } else {
        "State: idle"
    };
    items.push(ListItem::new(Line::from(Span::styled(state_str, Style::default().fg(Color::DarkGray)))));
    items.push(ListItem::new(""));

    let visible_count = app.animation_step.min(app.pipeline_steps.len());
    for (i, step) in app.pipeline_steps.iter().enumerate() {
        if i >= visible_count {
            break;
        }
        let (icon, label, color) = match step.status {
            StepStatus::Pass => ("  ▸", "PASS", Color::Green),
            StepStatus::Warn => ("  ▸", "WARN", Color::Yellow),
            StepStatus::Fail => ("  ▸", "FAIL", Color::Red),
        };
        let line = Line::from(vec![
            Span::styled(icon, Style::default().fg(Color::DarkGray)),
            Span::raw(format!(" {}: ", step.name)),
            Span::styled(label, Style::default().fg(color).add_modifier(Modifier::BOLD)),
            Span::styled(format!(" — {}", step.detail), Style::default().fg(Color::Gray)),
        ]);
        items.push(ListItem::new(line));
    }

    let block =
        Block::default().title(" Pipeline ").borders(Borders::ALL).border_style(Style::default().fg(Color::DarkGray));
    f.render_widget(List::new(items).block(block), area);
}

fn render_recommendation(f: &mut Frame, area: ratatui::layout::Rect, app: &App) {
    let text = app.recommendation_text.as_deref().unwrap_or("Press [r] to run the selected scenario.");
    let block = Block::default()
        .title(" Recommendation ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let paragraph = Paragraph::new(text).block(block).wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

fn render_footer(f: &mut Frame, area: ratatui::layout::Rect) {
    let spans = vec![
        Span::styled(" [1-6] ", Style::default().fg(Color::Cyan)),
        Span::raw("Select scenario  "),
        Span::styled("[r] ", Style::default().fg(Color::Cyan)),
        Span::raw("Run  "),
        Span::styled("[q] ", Style::default().fg(Color::Cyan)),
        Span::raw("Quit"),
    ];
    let footer = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::DarkGray)));
    f.render_widget(footer, area);
}

// ── Terminal setup / teardown ─────────────────────────────────────────────────

fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()
}

// ── Main event loop ───────────────────────────────────────────────────────────

fn main() -> io::Result<()> {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        default_hook(info);
    }));

    let (repository, _report) = abx_guidelines::load_default().expect("default guideline corpus should load");

    let mut terminal = setup_terminal()?;
    let mut app = App::new(repository);

    const TICK_MS: u64 = 150;

    loop {
        terminal.draw(|f| ui(f, &app))?;

        let timeout = if app.animating {
            let elapsed = app.last_tick.elapsed();
            Duration::from_millis(TICK_MS).saturating_sub(elapsed)
        } else {
            Duration::from_millis(200)
        };

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Char('Q') => break,
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => break,
                    KeyCode::Char(c) if c.is_ascii_digit() && c != '0' => {
                        let index = c.to_digit(10).unwrap() as usize - 1;
                        if let Some(scenario) = SCENARIOS.get(index) {
                            app.selected = *scenario;
                            app.pipeline_steps.clear();
                            app.recommendation_text = None;
                            app.animating = false;
                        }
                    }
                    KeyCode::Char('r') | KeyCode::Char('R') => app.run(),
                    _ => {}
                }
            }
        }

        if app.animating && app.last_tick.elapsed() >= Duration::from_millis(TICK_MS) {
            app.tick_animation();
            app.last_tick = Instant::now();
        }
    }

    restore_terminal(&mut terminal)?;
    Ok(())
}
