//! Transactional email templates
//!
//! Turns a [`NotificationPayload`] into a subject, an HTML body and a plain
//! text body. Every interpolated value is HTML-escaped.

use std::fmt::Write;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{
    AffectedTask, CareRecommendations, NotificationPayload, SummaryTask, TaskReminder,
    WeatherAlert, WeatherObservation, WeeklySummary,
};

/// Links that every email needs
#[derive(Debug, Clone)]
pub struct EmailContext {
    /// Public base URL of the web app, without trailing slash
    pub app_url: String,
    pub unsubscribe_url: String,
}

/// A rendered email, ready for the provider
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Render a notification payload
pub fn render(payload: &NotificationPayload, ctx: &EmailContext) -> RenderedEmail {
    let (subject, body) = match payload {
        NotificationPayload::TaskReminder(p) => render_task_reminder(p, ctx),
        NotificationPayload::WeatherAlert(p) => render_weather_alert(p, ctx),
        NotificationPayload::WeeklySummary(p) => render_weekly_summary(p, ctx),
        NotificationPayload::CareRecommendations(p) => render_care_recommendations(p, ctx),
    };

    RenderedEmail {
        html: body.to_html(&subject, ctx),
        text: body.to_text(ctx),
        subject,
    }
}

/// Escape text for inclusion in HTML
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn format_date(date: NaiveDate) -> String {
    date.format("%A, %B %-d").to_string()
}

fn describe_weather(w: &WeatherObservation) -> String {
    format!(
        "{}, {}°, {}% chance of rain, wind {}",
        w.condition,
        w.temperature.round(),
        w.precipitation.round(),
        w.wind_speed.round()
    )
}

/// Intermediate body shared by the HTML and text renderers
struct Body {
    greeting: String,
    intro: String,
    sections: Vec<Section>,
    call_to_action: Option<(String, String)>,
}

struct Section {
    heading: String,
    items: Vec<String>,
}

impl Section {
    fn new(heading: impl Into<String>, items: Vec<String>) -> Self {
        Self {
            heading: heading.into(),
            items,
        }
    }
}

impl Body {
    fn to_html(&self, title: &str, ctx: &EmailContext) -> String {
        let mut html = String::new();
        let _ = write!(
            html,
            "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{}</title></head>\
             <body style=\"font-family: sans-serif; color: #1f2933;\">",
            escape_html(title)
        );
        let _ = write!(html, "<p>{}</p>", escape_html(&self.greeting));
        let _ = write!(html, "<p>{}</p>", escape_html(&self.intro));

        for section in &self.sections {
            let _ = write!(html, "<h3>{}</h3>", escape_html(&section.heading));
            if section.items.is_empty() {
                html.push_str("<p><em>Nothing here.</em></p>");
                continue;
            }
            html.push_str("<ul>");
            for item in &section.items {
                let _ = write!(html, "<li>{}</li>", escape_html(item));
            }
            html.push_str("</ul>");
        }

        if let Some((label, path)) = &self.call_to_action {
            let _ = write!(
                html,
                "<p><a href=\"{}{}\">{}</a></p>",
                escape_html(&ctx.app_url),
                escape_html(path),
                escape_html(label)
            );
        }

        let _ = write!(
            html,
            "<hr><p style=\"font-size: 12px; color: #7b8794;\">You are receiving this email from LawnSync. \
             <a href=\"{}\">Unsubscribe</a></p></body></html>",
            escape_html(&ctx.unsubscribe_url)
        );
        html
    }

    fn to_text(&self, ctx: &EmailContext) -> String {
        let mut text = String::new();
        let _ = writeln!(text, "{}\n", self.greeting);
        let _ = writeln!(text, "{}\n", self.intro);

        for section in &self.sections {
            let _ = writeln!(text, "{}", section.heading);
            if section.items.is_empty() {
                let _ = writeln!(text, "  (nothing here)");
            }
            for item in &section.items {
                let _ = writeln!(text, "  - {}", item);
            }
            text.push('\n');
        }

        if let Some((label, path)) = &self.call_to_action {
            let _ = writeln!(text, "{}: {}{}\n", label, ctx.app_url, path);
        }

        let _ = write!(text, "Unsubscribe: {}", ctx.unsubscribe_url);
        text
    }
}

fn render_task_reminder(p: &TaskReminder, _ctx: &EmailContext) -> (String, Body) {
    let subject = format!("Reminder: {} on {}", p.task_name, format_date(p.scheduled_date));

    let mut details = vec![
        p.task_description.clone(),
        format!("Estimated time: {} minutes", p.estimated_duration),
    ];
    if let Some(w) = &p.weather {
        details.push(format!("Expected weather: {}", describe_weather(w)));
    }

    let mut sections = vec![Section::new("Task details", details)];
    if !p.products.is_empty() {
        sections.push(Section::new("What you'll need", p.products.clone()));
    }

    let body = Body {
        greeting: format!("Hi {},", p.user_name),
        intro: format!(
            "{} is scheduled for {} on {}.",
            p.task_name,
            p.lawn_name,
            format_date(p.scheduled_date)
        ),
        sections,
        call_to_action: Some(("View your schedule".to_string(), "/schedule".to_string())),
    };
    (subject, body)
}

fn affected_line(t: &AffectedTask) -> String {
    match t.new_date {
        Some(new_date) => format!(
            "{}: moved from {} to {} ({})",
            t.task_name,
            format_date(t.original_date),
            format_date(new_date),
            t.reason
        ),
        None => format!(
            "{}: on hold from {}, no suitable day in the forecast ({})",
            t.task_name,
            format_date(t.original_date),
            t.reason
        ),
    }
}

fn render_weather_alert(p: &WeatherAlert, _ctx: &EmailContext) -> (String, Body) {
    let subject = format!("Weather alert for {}: {}", p.lawn_name, p.headline);

    let mut sections = vec![Section::new(
        "Schedule changes",
        p.affected_tasks.iter().map(affected_line).collect(),
    )];
    if let Some(w) = &p.weather {
        sections.push(Section::new("Conditions", vec![describe_weather(w)]));
    }

    let body = Body {
        greeting: format!("Hi {},", p.user_name),
        intro: format!(
            "{}. We adjusted {} task(s) on {}.",
            p.headline,
            p.affected_tasks.len(),
            p.lawn_name
        ),
        sections,
        call_to_action: Some(("Review your schedule".to_string(), "/schedule".to_string())),
    };
    (subject, body)
}

fn summary_lines(tasks: &[SummaryTask]) -> Vec<String> {
    tasks
        .iter()
        .map(|t| format!("{} ({})", t.task_name, format_date(t.date)))
        .collect()
}

fn render_weekly_summary(p: &WeeklySummary, _ctx: &EmailContext) -> (String, Body) {
    let subject = format!(
        "Your week on {}: {} done, {} coming up",
        p.lawn_name,
        p.completed_tasks.len(),
        p.upcoming_tasks.len()
    );

    let mut sections = vec![
        Section::new("Completed", summary_lines(&p.completed_tasks)),
        Section::new("Coming up", summary_lines(&p.upcoming_tasks)),
    ];
    if !p.skipped_tasks.is_empty() {
        sections.insert(1, Section::new("Skipped", summary_lines(&p.skipped_tasks)));
    }
    if !p.forecast.is_empty() {
        sections.push(Section::new(
            "Forecast",
            p.forecast
                .iter()
                .map(|w| format!("{}: {}", format_date(w.date), describe_weather(w)))
                .collect(),
        ));
    }

    let body = Body {
        greeting: format!("Hi {},", p.user_name),
        intro: format!(
            "Here is your lawn care summary for the week of {}.",
            format_date(p.week_start)
        ),
        sections,
        call_to_action: Some(("Open LawnSync".to_string(), "/dashboard".to_string())),
    };
    (subject, body)
}

fn render_care_recommendations(p: &CareRecommendations, _ctx: &EmailContext) -> (String, Body) {
    let subject = format!("{} care tips for {}", capitalize(p.season.as_str()), p.lawn_name);

    let items = p
        .recommendations
        .iter()
        .map(|r| {
            let mut line = format!("[{}] {}: {}", r.priority, r.title, r.description);
            if let Some(note) = &r.weather_note {
                let _ = write!(line, " (wait: {})", note);
            }
            line
        })
        .collect();

    let body = Body {
        greeting: format!("Hi {},", p.user_name),
        intro: format!(
            "Based on the season and your {} lawn, here is what to focus on.",
            p.grass_type
        ),
        sections: vec![Section::new("Recommended tasks", items)],
        call_to_action: Some(("See recommendations".to_string(), "/recommendations".to_string())),
    };
    (subject, body)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
