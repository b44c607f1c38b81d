use std::borrow::Cow;
use std::fmt::Write;

use crate::agent::analytics::WindowStats;
use crate::models::TransactionRecord;

pub const DEFAULT_MAX_PROMPT_CHARS: usize = 12_000;

pub const SYSTEM_PROMPT: &str = "You are a marketing AI assistant. You will be provided with structured sales \
analytics data and a sample of the latest transactions. Based on this data, generate a creative and actionable \
sales promotion strategy to maximize sales.";

const INSTRUCTIONS: &str = "Based on this data, generate a series of sales promos that users would see on the \
website. Be fun and creative! Make sure to link to the data points and estimate sales for each campaign.";

// Room for the row listing header and the omitted-rows line.
const ROW_HEADER_RESERVE: usize = 128;

/// Customer, city and country names longer than this are cut in the prompt.
const NAME_CHARS: usize = 40;

#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
    pub included_rows: usize,
    /// Older rows were left out to respect the size limit.
    pub truncated: bool
}

/// Renders a window of rows and its analytics into a bounded chat prompt.
///
/// `max_chars` bounds the system and user text together, counted in bytes.
/// The instructions are always present. The analytics drop their lowest
/// ranked customers, then cities, when they do not fit. Rows are added newest
/// first until the limit is reached, then listed oldest first.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    max_chars: usize
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PROMPT_CHARS)
    }
}

impl PromptBuilder {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    pub fn build(&self, records: &[TransactionRecord], stats: &WindowStats) -> Prompt {
        let fixed = SYSTEM_PROMPT.len() + INSTRUCTIONS.len() + ROW_HEADER_RESERVE;
        let budget = self.max_chars.saturating_sub(fixed);
        let analytics = fit_analytics(stats, budget);
        let mut remaining = budget.saturating_sub(analytics.len());
        let mut lines = Vec::new();

        for record in records.iter().rev() {
            let line = render_row(record);

            if line.len() + 1 > remaining {
                break;
            }

            remaining -= line.len() + 1;
            lines.push(line);
        }

        lines.reverse();

        let omitted = records.len() - lines.len();
        let mut user = analytics;

        let _ = writeln!(user, "\nLatest transactions ({} of {}, oldest first):", lines.len(), records.len());

        for line in &lines {
            user.push_str(line);
            user.push('\n');
        }

        if omitted > 0 {
            let _ = writeln!(user, "({omitted} older rows omitted)");
        }

        user.push('\n');
        user.push_str(INSTRUCTIONS);

        Prompt {
            system: SYSTEM_PROMPT.to_string(),
            user,
            included_rows: lines.len(),
            truncated: omitted > 0
        }
    }
}

fn fit_analytics(stats: &WindowStats, budget: usize) -> String {
    let mut stats = stats.clone();

    loop {
        let rendered = render_analytics(&stats);

        if rendered.len() <= budget {
            return rendered;
        }

        if stats.top_customers.pop().is_none() && stats.top_cities.pop().is_none() {
            return keep_whole_lines(&rendered, budget);
        }
    }
}

fn keep_whole_lines(text: &str, budget: usize) -> String {
    let mut kept = String::new();

    for line in text.split_inclusive('\n') {
        if kept.len() + line.len() > budget {
            break;
        }

        kept.push_str(line);
    }

    kept
}

fn shorten(name: &str) -> Cow<'_, str> {
    match name.char_indices().nth(NAME_CHARS) {
        Some((end, _)) => Cow::Owned(format!("{}...", &name[..end])),
        None => Cow::Borrowed(name)
    }
}

// Writing into a String cannot fail, so the fmt::Result values are discarded.
fn render_analytics(stats: &WindowStats) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Here is the latest sales analytics data over {} transactions:", stats.rows);

    let _ = writeln!(output, "\nTotal sales per product:");
    for (product, sales) in &stats.sales_per_product {
        let _ = writeln!(output, "- {product}: {sales}");
    }

    let _ = writeln!(output, "\nAverage transaction value per customer (top {}):", stats.top_customers.len());
    for (customer, value) in &stats.top_customers {
        let _ = writeln!(output, "- {}: {value}", shorten(customer));
    }

    let _ = writeln!(output, "\nNumber of transactions per payment method:");
    for (method, count) in &stats.transactions_per_payment_method {
        let _ = writeln!(output, "- {method}: {count}");
    }

    let _ = writeln!(output, "\nTop {} cities by total sales:", stats.top_cities.len());
    for (city, sales) in &stats.top_cities {
        let _ = writeln!(output, "- {}: {sales}", shorten(city));
    }

    let _ = writeln!(output, "\nMin, max and average price per unit for each product:");
    for (product, prices) in &stats.price_per_product {
        let _ = writeln!(output, "- {product}: min {} | max {} | avg {}", prices.min, prices.max, prices.avg);
    }

    output
}

fn render_row(record: &TransactionRecord) -> String {
    format!(
        "{} | {} x{} @ {} | {} | {}, {} | {}",
        record.timestamp().format("%Y-%m-%d %H:%M:%S"),
        record.product(),
        record.quantity(),
        record.price_per_unit(),
        record.payment_method(),
        shorten(record.city()),
        shorten(record.country()),
        shorten(record.customer_name())
    )
}
