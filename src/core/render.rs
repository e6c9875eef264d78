//! Line rendering
//!
//! A [`LineTemplate`] is scanned once when the logger is built: it records
//! which field tags are present and prepares a colour-free variant plus one
//! coloured variant per level. Rendering a record then computes only the
//! fields the template uses and runs a single substitution pass per output.
//!
//! Field tags:
//!
//! | tag | value |
//! |---|---|
//! | `{message}` | message template with its positional arguments |
//! | `{datetime}` | timestamp, strftime pattern + sub-second digits |
//! | `{file}` | elided file name and padded line number, `name.rs:12  ` |
//! | `{level}` | single-letter level code |
//! | `{levelname}` | long level name |
//! | `{thread}` | name or id of the submitting thread |
//! | `{indent}` | scope depth times the indent width, in spaces |
//!
//! Colour tags (`{nc}`, `{bold}`, `{italic}`, `{lc}` and the colour names)
//! become escape sequences in the coloured output and vanish from the plain
//! one. Any other tag is copied through literally.

use super::colors;
use super::config::LoggerConfig;
use super::datetime::{self, DatetimePrecision};
use super::format;
use super::log_level::LogLevel;
use super::log_record::LogRecord;

/// Names of the tags filled from the record.
pub const FIELD_TAGS: [&str; 7] = [
    "message",
    "datetime",
    "file",
    "level",
    "levelname",
    "thread",
    "indent",
];

/// Settings the renderer reads besides the template itself.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    pub datetime_format: String,
    pub datetime_precision: DatetimePrecision,
    pub max_filename_len: usize,
    pub line_number_width: usize,
    pub indent_width: usize,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self::from(&LoggerConfig::default())
    }
}

impl From<&LoggerConfig> for RenderSettings {
    fn from(config: &LoggerConfig) -> Self {
        Self {
            datetime_format: config.datetime_format.clone(),
            datetime_precision: config.datetime_precision,
            max_filename_len: config.max_filename_len,
            line_number_width: config.line_number_width,
            indent_width: config.indent_width,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct FieldSet {
    message: bool,
    datetime: bool,
    file: bool,
    thread: bool,
    indent: bool,
}

impl FieldSet {
    fn scan(template: &str) -> Self {
        Self {
            message: format::has_tag(template, "message"),
            datetime: format::has_tag(template, "datetime"),
            file: format::has_tag(template, "file"),
            thread: format::has_tag(template, "thread"),
            indent: format::has_tag(template, "indent"),
        }
    }
}

/// A line template prepared for repeated rendering.
#[derive(Debug, Clone)]
pub struct LineTemplate {
    raw: String,
    plain: String,
    colored: Vec<String>,
    fields: FieldSet,
}

impl LineTemplate {
    pub fn compile(template: &str) -> Self {
        let plain = format::erase_tags_where(template, colors::is_color_tag);
        let colored = LogLevel::ALL
            .iter()
            .map(|&level| {
                format::format_with(template, |name, out| match colors::color_code(name, level) {
                    Some(code) => {
                        out.push_str(&code);
                        true
                    }
                    None => false,
                })
            })
            .collect();

        Self {
            raw: template.to_string(),
            plain,
            colored,
            fields: FieldSet::scan(template),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The template with every colour tag removed.
    pub fn plain(&self) -> &str {
        &self.plain
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        format::has_tag(&self.raw, tag)
    }

    fn variant(&self, level: LogLevel, colorize: bool) -> &str {
        if colorize {
            &self.colored[level.index()]
        } else {
            &self.plain
        }
    }
}

/// The outputs produced for one record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedLine {
    /// Colour escapes applied, for terminals
    pub colored: Option<String>,
    /// Colour tags removed, for files and uncoloured consoles
    pub plain: Option<String>,
}

/// Field values computed for one record, only for tags the template uses.
#[derive(Default)]
struct FieldValues {
    message: Option<String>,
    datetime: Option<String>,
    file: Option<String>,
    thread: Option<String>,
    indent: Option<String>,
}

/// Renders records against a compiled line template.
///
/// # Examples
///
/// ```
/// use rust_cascade_logger::core::{LineTemplate, RenderSettings, Renderer};
/// use rust_cascade_logger::{LogLevel, LogRecord};
///
/// let renderer = Renderer::new(LineTemplate::compile("{red}{level}{nc} {message}"), RenderSettings::default());
/// let record = LogRecord::new(LogLevel::Warning, "disk at {}%").with_args(["93"]);
///
/// assert_eq!(renderer.render(&record, false), "W disk at 93%");
/// assert_eq!(renderer.render(&record, true), "\x1b[31mW\x1b[0m disk at 93%");
/// ```
#[derive(Debug, Clone)]
pub struct Renderer {
    template: LineTemplate,
    settings: RenderSettings,
}

impl Renderer {
    pub fn new(template: LineTemplate, settings: RenderSettings) -> Self {
        Self { template, settings }
    }

    pub fn from_config(config: &LoggerConfig) -> Self {
        Self::new(
            LineTemplate::compile(&config.line_format),
            RenderSettings::from(config),
        )
    }

    pub fn template(&self) -> &LineTemplate {
        &self.template
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Render one output.
    pub fn render(&self, record: &LogRecord, colorize: bool) -> String {
        let values = self.compute_fields(record);
        self.fill(self.template.variant(record.level(), colorize), record, &values)
    }

    /// Render the requested outputs from one set of field values.
    pub fn render_outputs(&self, record: &LogRecord, colored: bool, plain: bool) -> RenderedLine {
        if !colored && !plain {
            return RenderedLine::default();
        }

        let values = self.compute_fields(record);
        RenderedLine {
            colored: colored
                .then(|| self.fill(self.template.variant(record.level(), true), record, &values)),
            plain: plain.then(|| self.fill(self.template.plain(), record, &values)),
        }
    }

    fn compute_fields(&self, record: &LogRecord) -> FieldValues {
        let fields = &self.template.fields;
        let settings = &self.settings;

        FieldValues {
            message: fields.message.then(|| record.message()),
            datetime: fields.datetime.then(|| {
                datetime::format_datetime(
                    record.timestamp(),
                    &settings.datetime_format,
                    settings.datetime_precision,
                )
            }),
            file: fields.file.then(|| {
                format_location(
                    record.location().file(),
                    record.location().line(),
                    settings.max_filename_len,
                    settings.line_number_width,
                )
            }),
            thread: fields.thread.then(|| record.thread().to_string()),
            indent: fields
                .indent
                .then(|| " ".repeat(record.scope_depth() * settings.indent_width)),
        }
    }

    fn fill(&self, variant: &str, record: &LogRecord, values: &FieldValues) -> String {
        format::format_with(variant, |name, out| {
            let value = match name {
                "message" => values.message.as_deref(),
                "datetime" => values.datetime.as_deref(),
                "file" => values.file.as_deref(),
                "level" => Some(record.level().code()),
                "levelname" => Some(record.level().to_str()),
                "thread" => values.thread.as_deref(),
                "indent" => values.indent.as_deref(),
                _ => None,
            };
            match value {
                Some(value) => {
                    out.push_str(value);
                    true
                }
                None => false,
            }
        })
    }
}

/// Render `record` against a template string in one call.
pub fn render(record: &LogRecord, template: &str, colorize: bool, settings: &RenderSettings) -> String {
    Renderer::new(LineTemplate::compile(template), settings.clone()).render(record, colorize)
}

/// Last path component, accepting both separators.
fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Fit a file name into exactly `width` characters.
///
/// Short names are left-padded with spaces. Long names keep the start of the
/// stem, an ellipsis, the last two stem characters and the extension, e.g.
/// `a_...me.cc`. When even that does not fit the stem is cut at `width`.
pub fn elide_filename(path: &str, width: usize) -> String {
    let name = basename(path);
    let len = name.chars().count();
    if len <= width {
        return format!("{}{}", " ".repeat(width - len), name);
    }

    let (stem, ext) = match name.rfind('.') {
        Some(dot) if dot > 0 => (&name[..dot], Some(&name[dot + 1..])),
        _ => (name, None),
    };
    let stem_chars: Vec<char> = stem.chars().collect();

    let reserved = 3 + 2 + ext.map_or(0, |e| 1 + e.chars().count());
    let budget = width as isize - reserved as isize;
    if budget <= 0 {
        return stem_chars.iter().take(width).collect();
    }

    let prefix: String = stem_chars.iter().take(budget as usize).collect();
    let tail: String = stem_chars[stem_chars.len().saturating_sub(2)..].iter().collect();
    match ext {
        Some(ext) => format!("{}...{}.{}", prefix, tail, ext),
        None => format!("{}...{}", prefix, tail),
    }
}

/// `{file}` value: elided name, a colon, the line number padded on the right.
pub fn format_location(path: &str, line: u32, max_filename_len: usize, line_number_width: usize) -> String {
    format!(
        "{}:{:<width$}",
        elide_filename(path, max_filename_len),
        line,
        width = line_number_width
    )
}
