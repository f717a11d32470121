/// Dashboard frame aggregation and rendering
///
/// `DashboardFrame::build` turns one poll's `StatusReport` into everything the
/// screen shows: per-category lines in registry order, the aggregate counts
/// and the overall summary. `Dashboard::render` draws a frame with ratatui.

use chrono::{DateTime, Local};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
    Frame,
};
use std::fmt;
use std::time::Duration;

use crate::core::collector::StatusReport;
use crate::core::registry::{Registry, ServiceCategory};
use crate::core::status::{classify, CountBucket, DisplayCategory};
use crate::utils::format_millis;

/// One rendered service row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceLine {
    pub name: String,
    pub port: String,
    pub category: DisplayCategory,
}

impl fmt::Display for ServiceLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<12} {:<10} :{}", self.name, self.category.label(), self.port)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub total: usize,
    pub healthy: usize,
    pub starting: usize,
    pub stopped: usize,
}

impl StatusCounts {
    fn record(&mut self, category: DisplayCategory) {
        self.total += 1;
        match category.bucket() {
            CountBucket::Healthy => self.healthy += 1,
            CountBucket::Starting => self.starting += 1,
            CountBucket::Stopped => self.stopped += 1,
        }
    }
}

/// Overall one-line classification of the stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Summary {
    AllHealthy,
    StartingUp,
    NoneRunning,
}

impl Summary {
    pub fn from_counts(counts: &StatusCounts) -> Self {
        if counts.healthy == counts.total {
            Summary::AllHealthy
        } else if counts.healthy + counts.starting > 0 {
            Summary::StartingUp
        } else {
            Summary::NoneRunning
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Summary::AllHealthy => "🎉 All services healthy",
            Summary::StartingUp => "⏳ Services starting up",
            Summary::NoneRunning => "🛑 No services running",
        }
    }

    fn color(&self) -> Color {
        match self {
            Summary::AllHealthy => Color::Green,
            Summary::StartingUp => Color::Yellow,
            Summary::NoneRunning => Color::Red,
        }
    }
}

/// Snapshot of one poll, ready to draw
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardFrame {
    pub timestamp: String,
    pub infra: Vec<ServiceLine>,
    pub app: Vec<ServiceLine>,
    pub counts: StatusCounts,
    pub summary: Summary,
    /// Degraded-cycle messages (runtime unreachable, ambiguous or late lookups)
    pub notices: Vec<String>,
}

impl DashboardFrame {
    pub fn build(registry: &Registry, report: &StatusReport, now: DateTime<Local>) -> Self {
        let mut counts = StatusCounts::default();
        let mut lines_for = |group: ServiceCategory| -> Vec<ServiceLine> {
            registry
                .in_category(group)
                .map(|service| {
                    let category = classify(&report.status_of(&service.container_id));
                    counts.record(category);
                    ServiceLine {
                        name: service.name.clone(),
                        port: service.port.clone(),
                        category,
                    }
                })
                .collect()
        };
        let infra = lines_for(ServiceCategory::Infra);
        let app = lines_for(ServiceCategory::App);

        Self {
            timestamp: now.format("%H:%M:%S").to_string(),
            infra,
            app,
            counts,
            summary: Summary::from_counts(&counts),
            notices: notices(registry, report),
        }
    }

    pub fn lines(&self, category: ServiceCategory) -> &[ServiceLine] {
        match category {
            ServiceCategory::Infra => &self.infra,
            ServiceCategory::App => &self.app,
        }
    }
}

fn notices(registry: &Registry, report: &StatusReport) -> Vec<String> {
    let names = |ids: &[String]| -> String {
        registry
            .services()
            .iter()
            .filter(|s| ids.contains(&s.container_id))
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut notices = Vec::new();
    if let Some(err) = &report.runtime_error {
        notices.push(format!("Runtime unreachable, statuses unknown: {}", err));
    }
    if !report.ambiguous.is_empty() {
        notices.push(format!(
            "Several containers match {} (showing the first listed)",
            names(&report.ambiguous)
        ));
    }
    if !report.timed_out.is_empty() {
        notices.push(format!("No answer in time for {}", names(&report.timed_out)));
    }
    notices
}

/// Timing of the cycle that produced a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleTiming {
    pub elapsed: Duration,
    pub interval: Duration,
}

impl fmt::Display for CycleTiming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Update: {} │ Interval: {}",
            format_millis(self.elapsed),
            format_millis(self.interval)
        )
    }
}

fn category_color(category: DisplayCategory) -> Color {
    match category {
        DisplayCategory::Healthy => Color::Green,
        DisplayCategory::Starting | DisplayCategory::Restarting => Color::Yellow,
        DisplayCategory::Unhealthy => Color::Red,
        DisplayCategory::Paused => Color::Blue,
        DisplayCategory::Stopped => Color::DarkGray,
    }
}

pub struct Dashboard {
    title: String,
}

impl Dashboard {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
        }
    }

    pub fn render(&self, frame: &mut Frame, snapshot: &DashboardFrame, timing: &CycleTiming) {
        let notice_height = if snapshot.notices.is_empty() {
            0
        } else {
            snapshot.notices.len() as u16 + 2
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(snapshot.infra.len() as u16 + 3),
                Constraint::Length(snapshot.app.len() as u16 + 3),
                Constraint::Length(3),
                Constraint::Length(notice_height),
                Constraint::Min(0),
                Constraint::Length(2),
            ])
            .split(frame.size());

        self.render_header(frame, chunks[0], snapshot);
        Self::render_services(frame, chunks[1], ServiceCategory::Infra, snapshot.lines(ServiceCategory::Infra));
        Self::render_services(frame, chunks[2], ServiceCategory::App, snapshot.lines(ServiceCategory::App));
        Self::render_totals(frame, chunks[3], snapshot);
        if notice_height > 0 {
            Self::render_notices(frame, chunks[4], &snapshot.notices);
        }
        Self::render_footer(frame, chunks[6], timing);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect, snapshot: &DashboardFrame) {
        let header = Paragraph::new(Line::from(vec![
            Span::styled(
                format!("🔍 {}", self.title),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  │  "),
            Span::styled(snapshot.timestamp.clone(), Style::default().fg(Color::Gray)),
        ]))
        .block(Block::default().borders(Borders::ALL));

        frame.render_widget(header, area);
    }

    fn render_services(frame: &mut Frame, area: Rect, category: ServiceCategory, lines: &[ServiceLine]) {
        let header = Row::new(vec!["Service", "Status", "Port"])
            .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

        let rows: Vec<Row> = lines
            .iter()
            .map(|line| {
                let status_style = Style::default().fg(category_color(line.category));
                Row::new(vec![
                    Cell::from(line.name.clone()),
                    Cell::from(Span::styled(
                        format!("{} {}", line.category.icon(), line.category.label()),
                        status_style,
                    )),
                    Cell::from(Span::styled(format!(":{}", line.port), Style::default().fg(Color::Cyan))),
                ])
            })
            .collect();

        let table = Table::new(
            rows,
            [Constraint::Length(16), Constraint::Length(16), Constraint::Min(6)],
        )
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {}  {} ", category.icon(), category.title())),
        );

        frame.render_widget(table, area);
    }

    fn render_totals(frame: &mut Frame, area: Rect, snapshot: &DashboardFrame) {
        let counts = &snapshot.counts;
        let bold = |color: Color| Style::default().fg(color).add_modifier(Modifier::BOLD);

        let totals = Paragraph::new(Line::from(vec![
            Span::styled(format!("✅ {}", counts.healthy), bold(Color::Green)),
            Span::raw("  "),
            Span::styled(format!("⏳ {}", counts.starting), bold(Color::Yellow)),
            Span::raw("  "),
            Span::styled(format!("❌ {}", counts.stopped), bold(Color::Red)),
            Span::raw("  "),
            Span::styled(format!("📊 {}", counts.total), bold(Color::Blue)),
            Span::raw("  │  "),
            Span::styled(snapshot.summary.message(), bold(snapshot.summary.color())),
        ]))
        .block(Block::default().borders(Borders::ALL).title(" Summary "));

        frame.render_widget(totals, area);
    }

    fn render_notices(frame: &mut Frame, area: Rect, notices: &[String]) {
        let lines: Vec<Line> = notices
            .iter()
            .map(|n| Line::from(Span::styled(n.clone(), Style::default().fg(Color::Red))))
            .collect();

        let paragraph = Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title(" Warnings "));

        frame.render_widget(paragraph, area);
    }

    fn render_footer(frame: &mut Frame, area: Rect, timing: &CycleTiming) {
        let gray = Style::default().fg(Color::DarkGray);
        let footer = Paragraph::new(vec![
            Line::from(Span::styled(timing.to_string(), gray)),
            Line::from(vec![
                Span::styled("⚡ ", gray),
                Span::styled("Ctrl+C", Style::default().fg(Color::Cyan)),
                Span::styled(" to exit", gray),
            ]),
        ]);

        frame.render_widget(footer, area);
    }
}
