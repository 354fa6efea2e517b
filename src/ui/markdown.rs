//! Topic guides drawn as egui rich text

use egui::text::{LayoutJob, TextFormat};
use egui::{Color32, FontId, Stroke, Style};
use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};

/// Font sizes for body text and headings
#[derive(Debug, Clone)]
pub struct MarkdownStyle {
    pub body_size: f32,
    pub heading_sizes: [f32; 3],
    pub code_color: Color32,
}

impl Default for MarkdownStyle {
    fn default() -> Self {
        Self {
            body_size: 14.0,
            heading_sizes: [20.0, 17.0, 15.0],
            code_color: Color32::from_rgb(0xB4, 0x53, 0x09),
        }
    }
}

#[derive(Default)]
struct Formatting {
    strong: usize,
    emphasis: usize,
    strike: usize,
    heading: Option<HeadingLevel>,
    link: usize,
    code_block: bool,
}

/// Lays out a guide. Links are underlined but not clickable; the sources
/// list carries the clickable links.
pub fn markdown_job(markdown: &str, ui_style: &Style, style: &MarkdownStyle) -> LayoutJob {
    let mut job = LayoutJob::default();
    let mut state = Formatting::default();
    let mut list_depth = 0usize;
    let mut ordered: Vec<Option<u64>> = Vec::new();

    let visuals = &ui_style.visuals;
    let format = |state: &Formatting| {
        let size = match state.heading {
            Some(HeadingLevel::H1) => style.heading_sizes[0],
            Some(HeadingLevel::H2) => style.heading_sizes[1],
            Some(_) => style.heading_sizes[2],
            None => style.body_size,
        };
        let font_id = if state.code_block {
            FontId::monospace(size * 0.9)
        } else {
            FontId::proportional(size)
        };
        let color = if state.code_block {
            style.code_color
        } else if state.link > 0 {
            visuals.hyperlink_color
        } else if state.strong > 0 || state.heading.is_some() {
            visuals.strong_text_color()
        } else {
            visuals.text_color()
        };
        TextFormat {
            font_id,
            color,
            italics: state.emphasis > 0,
            underline: if state.link > 0 { Stroke::new(1.0, color) } else { Stroke::NONE },
            strikethrough: if state.strike > 0 { Stroke::new(1.0, color) } else { Stroke::NONE },
            ..Default::default()
        }
    };

    let newline = |job: &mut LayoutJob, state: &Formatting| {
        if !job.text.is_empty() && !job.text.ends_with('\n') {
            job.append("\n", 0.0, format(state));
        }
    };

    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    for event in Parser::new_ext(markdown, options) {
        match event {
            Event::Start(tag) => match tag {
                Tag::Heading { level, .. } => {
                    newline(&mut job, &state);
                    if !job.text.is_empty() {
                        job.append("\n", 0.0, format(&state));
                    }
                    state.heading = Some(level);
                }
                Tag::Paragraph => newline(&mut job, &state),
                Tag::Strong => state.strong += 1,
                Tag::Emphasis => state.emphasis += 1,
                Tag::Strikethrough => state.strike += 1,
                Tag::Link { .. } => state.link += 1,
                Tag::CodeBlock(_) => {
                    newline(&mut job, &state);
                    state.code_block = true;
                }
                Tag::List(start) => {
                    newline(&mut job, &state);
                    list_depth += 1;
                    ordered.push(start);
                }
                Tag::Item => {
                    newline(&mut job, &state);
                    let indent = "    ".repeat(list_depth.saturating_sub(1));
                    let bullet = match ordered.last_mut() {
                        Some(Some(n)) => {
                            let label = format!("{indent}{n}. ");
                            *n += 1;
                            label
                        }
                        _ => format!("{indent}• "),
                    };
                    job.append(&bullet, 0.0, format(&state));
                }
                Tag::TableRow | Tag::TableHead => newline(&mut job, &state),
                Tag::TableCell => {
                    if !job.text.ends_with('\n') && !job.text.is_empty() {
                        job.append(" | ", 0.0, format(&state));
                    }
                }
                _ => {}
            },
            Event::End(tag) => match tag {
                TagEnd::Heading(_) => {
                    state.heading = None;
                    job.append("\n", 0.0, format(&state));
                }
                TagEnd::Paragraph => job.append("\n", 0.0, format(&state)),
                TagEnd::Strong => state.strong = state.strong.saturating_sub(1),
                TagEnd::Emphasis => state.emphasis = state.emphasis.saturating_sub(1),
                TagEnd::Strikethrough => state.strike = state.strike.saturating_sub(1),
                TagEnd::Link => state.link = state.link.saturating_sub(1),
                TagEnd::CodeBlock => {
                    state.code_block = false;
                    newline(&mut job, &state);
                }
                TagEnd::List(_) => {
                    list_depth = list_depth.saturating_sub(1);
                    ordered.pop();
                    newline(&mut job, &state);
                }
                TagEnd::TableHead | TagEnd::TableRow => newline(&mut job, &state),
                _ => {}
            },
            Event::Text(text) => job.append(&text, 0.0, format(&state)),
            Event::Code(code) => {
                let mut code_format = format(&state);
                code_format.font_id = FontId::monospace(style.body_size * 0.9);
                code_format.color = style.code_color;
                job.append(&code, 0.0, code_format);
            }
            Event::SoftBreak => job.append(" ", 0.0, format(&state)),
            Event::HardBreak => job.append("\n", 0.0, format(&state)),
            Event::Rule => {
                newline(&mut job, &state);
                job.append("――――――――\n", 0.0, format(&state));
            }
            _ => {}
        }
    }

    while job.text.ends_with('\n') {
        job.text.pop();
        if let Some(section) = job.sections.last_mut() {
            section.byte_range.end = section.byte_range.end.min(job.text.len());
            if section.byte_range.start >= section.byte_range.end {
                job.sections.pop();
            }
        }
    }
    job
}
