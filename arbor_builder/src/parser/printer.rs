use terminal_size::{terminal_size, Width};

use crate::constant::*;
use crate::model::InvokerKind;
use crate::parser::interface::Invoker;

#[cfg(feature = "tracing_debug")]
use tracing::debug;

#[derive(Debug)]
struct PaddingWidth(usize);

impl PaddingWidth {
    fn new(width: usize) -> Option<Self> {
        // padding must be at least 1
        (width >= 1).then_some(PaddingWidth(width))
    }
}

#[derive(Debug)]
struct LeftWidth(usize);

impl LeftWidth {
    fn new(width: usize) -> Option<Self> {
        // left must be at least 1
        (width >= 1).then_some(LeftWidth(width))
    }
}

#[derive(Debug)]
struct MiddleWidth(usize);

impl MiddleWidth {
    fn new(width: usize) -> Option<Self> {
        // middle must be at least 2 (so we can hyphenate)
        (width >= 2).then_some(MiddleWidth(width))
    }
}

#[derive(Debug)]
struct TotalWidth(usize);

/// Lays out a usage column and a description column, wrapping the descriptions.
#[derive(Debug)]
struct ColumnRenderer {
    padding: PaddingWidth,
    left: LeftWidth,
    middle: MiddleWidth,
}

// We'll target 95% of the total width, to ensure the renderer doesn't literally use the full space.
const TARGET_TOTAL_FACTOR: f64 = 0.95;

// Let's assume the average word length is 5.
// Then 17 is a good minimum, because it allows precisely 3 words with a space between them.
const MINIMUM_MIDDLE_WIDTH: usize = 17;
const PADDING_WIDTH: usize = 3;
const MAIN_INDENT: usize = 1;

impl ColumnRenderer {
    /// Produce a renderer based off the provided widths.
    /// This renderer will use a heuristic to chose the middle width.
    fn guided(
        padding: PaddingWidth,
        left: LeftWidth,
        middle: MiddleWidth,
        total_width: TotalWidth,
    ) -> Self {
        let non_middle: usize = left.0 + padding.0;
        let target_total_width = (total_width.0 as f64 * TARGET_TOTAL_FACTOR) as usize;
        let guided_middle = std::cmp::max(middle.0, MINIMUM_MIDDLE_WIDTH);

        if guided_middle + non_middle <= target_total_width {
            #[cfg(feature = "tracing_debug")]
            {
                debug!("Usages {non_middle} and descriptions fit within the target total {target_total_width}.  Selecting middle: {guided_middle}.");
            }

            Self::new(padding, left, MiddleWidth(guided_middle))
        } else if non_middle < total_width.0 {
            let calculated_middle =
                std::cmp::max(total_width.0 - non_middle, MINIMUM_MIDDLE_WIDTH);
            #[cfg(feature = "tracing_debug")]
            {
                debug!(
                    "Usages {non_middle} fit within the total {}.  Selecting middle: {calculated_middle}.",
                    total_width.0
                );
            }

            Self::new(padding, left, MiddleWidth(calculated_middle))
        } else {
            #[cfg(feature = "tracing_debug")]
            {
                debug!(
                    "Usages {non_middle} do not fit within the total {}.  Selecting middle: {MINIMUM_MIDDLE_WIDTH}.",
                    total_width.0
                );
            }

            Self::new(padding, left, MiddleWidth(MINIMUM_MIDDLE_WIDTH))
        }
    }

    fn new(padding: PaddingWidth, left: LeftWidth, middle: MiddleWidth) -> Self {
        Self {
            padding,
            left,
            middle,
        }
    }

    fn render(&self, indent: usize, left: &str, middle: &str) -> Vec<String> {
        let padding = self.padding.0;
        let padding = format!("{:padding$}", "");
        let left_column_width = self.left.0;
        assert!(left.chars().count() <= left_column_width);
        let middle_column_width = self.middle.0 - indent;
        let middle_parts = chunk(middle, middle_column_width);
        let mut out = Vec::default();

        for (i, part) in middle_parts.iter().enumerate() {
            if i == 0 {
                out.push(format!(
                    "{:indent$}{:left_column_width$}{padding}{}",
                    "", left, part
                ));
            } else {
                out.push(format!(
                    "{:indent$}{:left_column_width$}{padding}{}",
                    "", "", part
                ));
            }
        }

        if out.is_empty() {
            out.push(format!("{:indent$}{}", "", left));
        }

        out
    }
}

fn chunk(paragraph: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::default();
    let mut current = String::default();

    for word in paragraph.split(' ') {
        if !word.is_empty() {
            if current.is_empty() {
                hyphenate(width, &mut lines, &mut current, word);
            } else if current.chars().count() + word.chars().count() < width {
                current.push(' ');
                current.push_str(word);
            } else {
                lines.push(current);
                current = String::default();
                hyphenate(width, &mut lines, &mut current, word);
            }
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

fn hyphenate(width: usize, lines: &mut Vec<String>, current: &mut String, word: &str) {
    let increment = width - 1;
    let characters: Vec<char> = word.chars().collect();
    let mut left = 0;
    let mut right = increment;

    while right + 1 < characters.len() {
        let mut line: String = characters[left..right].iter().collect();
        line.push('-');
        lines.push(line);
        left += increment;
        right += increment;
    }

    current.extend(&characters[left..]);
}

struct HelpEntry {
    usage: String,
    description: String,
}

/// Collects the entries of one help page, then sends them laid out in columns.
pub(crate) struct Printer {
    title: String,
    entries: Vec<HelpEntry>,
    total_width: usize,
}

impl Printer {
    /// A printer sized for `invoker`: the terminal width for the console, a fixed width otherwise.
    pub(crate) fn for_invoker(command_format: &str, invoker: &dyn Invoker) -> Self {
        let total_width = match invoker.kind() {
            InvokerKind::Console => match terminal_size() {
                Some((Width(width), _)) => width as usize,
                None => DEFAULT_HELP_WIDTH,
            },
            _ => DEFAULT_HELP_WIDTH,
        };

        Self::new(command_format, total_width)
    }

    pub(crate) fn new(command_format: &str, total_width: usize) -> Self {
        Self {
            title: format!("-------[ Command Help: {command_format} ]-------"),
            entries: Vec::default(),
            total_width,
        }
    }

    pub(crate) fn add_entry(&mut self, usage: impl Into<String>, description: impl Into<String>) {
        self.entries.push(HelpEntry {
            usage: usage.into(),
            description: description.into(),
        });
    }

    pub(crate) fn render(&self) -> Vec<String> {
        let mut out = vec![self.title.clone()];

        if self.entries.is_empty() {
            return out;
        }

        let left_column_width = self
            .entries
            .iter()
            .map(|entry| entry.usage.chars().count())
            .max()
            .unwrap_or_default();
        let middle_column_width = self
            .entries
            .iter()
            .map(|entry| entry.description.chars().count() + MAIN_INDENT)
            .max()
            .unwrap_or_default();
        let column_renderer = ColumnRenderer::guided(
            PaddingWidth::new(PADDING_WIDTH).expect("internal error - padding must be positive"),
            LeftWidth::new(std::cmp::max(1, left_column_width))
                .expect("internal error - left must be positive"),
            MiddleWidth::new(std::cmp::max(2, middle_column_width))
                .expect("internal error - middle must allow hyphenation"),
            TotalWidth(self.total_width),
        );

        for HelpEntry { usage, description } in &self.entries {
            out.extend(column_renderer.render(MAIN_INDENT, usage, description));
        }

        out
    }

    pub(crate) fn print(&self, invoker: &dyn Invoker) {
        for line in self.render() {
            invoker.send_message(&line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::RecordingInvoker;
    use rstest::rstest;

    #[test]
    fn render_empty() {
        // Setup
        let printer = Printer::new("/shop", 80);

        // Execute
        let lines = printer.render();

        // Verify
        assert_eq!(lines, vec!["-------[ Command Help: /shop ]-------"]);
    }

    #[test]
    fn render_entries() {
        // Setup
        let mut printer = Printer::new("/shop", 80);
        printer.add_entry("/shop <player> [amount]", "Buy items from a shop.");
        printer.add_entry("/shop remove <id>", "");

        // Execute
        let lines = printer.render();

        // Verify
        assert_eq!(
            lines.join("\n"),
            r#"-------[ Command Help: /shop ]-------
 /shop <player> [amount]   Buy items from a shop.
 /shop remove <id>"#
        );
    }

    #[test]
    fn render_wrapped() {
        // Setup
        let mut printer = Printer::new("/shop remove", 40);
        printer.add_entry("/shop remove <id>", "Removes the shopkeeper with the given id.");

        // Execute
        let lines = printer.render();

        // Verify
        assert_eq!(
            lines.join("\n"),
            r#"-------[ Command Help: /shop remove ]-------
 /shop remove <id>   Removes the
                     shopkeeper with the
                     given id."#
        );
    }

    #[test]
    fn render_wrapped_multibyte() {
        // Setup
        let description = format!("a{}", "é".repeat(40));
        let mut printer = Printer::new("/shop", 40);
        printer.add_entry("/shop", description.clone());

        // Execute
        let lines = printer.render();

        // Verify
        assert!(lines.len() > 2);
        assert!(lines[1].starts_with(" /shop   a"));
        let parts: Vec<String> = lines[1..]
            .iter()
            .map(|line| line.chars().skip(9).collect::<String>())
            .collect();
        let (last, hyphenated) = parts.split_last().unwrap();
        let mut joined = String::default();

        for part in hyphenated {
            assert!(part.ends_with('-'), "'{part}' is not hyphenated");
            joined.push_str(part.trim_end_matches('-'));
        }

        joined.push_str(last);
        assert_eq!(joined, description);
    }

    #[test]
    fn print() {
        // Setup
        let invoker = RecordingInvoker::player("alice");
        let mut printer = Printer::for_invoker("/shop", &invoker);
        printer.add_entry("/shop", "Open a shop.");

        // Execute
        printer.print(&invoker);

        // Verify
        assert_eq!(
            invoker.messages(),
            vec!["-------[ Command Help: /shop ]-------", " /shop   Open a shop."]
        );
    }

    #[rstest]
    #[case("", 5, vec![])]
    #[case("a b c", 5, vec!["a b c"])]
    #[case("a b c d", 5, vec!["a b c", "d"])]
    #[case("abcdefgh", 5, vec!["abcd-", "efgh"])]
    #[case("ab abcdefgh", 5, vec!["ab", "abcd-", "efgh"])]
    #[case("abcdefghi", 5, vec!["abcd-", "efghi"])]
    #[case("abcdefghij", 5, vec!["abcd-", "efgh-", "ij"])]
    #[case("ééééééé", 5, vec!["éééé-", "ééé"])]
    #[case("ab éééééé", 5, vec!["ab", "éééé-", "éé"])]
    fn chunk_paragraph(#[case] paragraph: &str, #[case] width: usize, #[case] expected: Vec<&str>) {
        assert_eq!(chunk(paragraph, width), expected);
    }
}
