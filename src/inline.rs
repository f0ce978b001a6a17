//! Inline markup resolver.
//!
//! Two passes over a text fragment:
//!
//! 1. Templates: `{{...}}` spans are reduced innermost-first. A span without a
//!    `|` becomes its interior, a transparent template becomes
//!    `"<name>: <param>"`, and anything else disappears.
//! 2. Wikilinks: `[[target|display]]` and `[[target]]` become
//!    [`CrossReferenceLabel`] segments.
//!
//! Both passes are cursor-based and stop at the first unmatched opener, so
//! the work done is bounded by the input length even for hostile input.
//! Nested templates are only approximated: once an inner span is replaced,
//! the outer one is resolved from the already-flattened text.

use crate::config::ExtractionConfig;
use crate::record::{CrossReferenceLabel, ResolvedText};
use tracing::trace;

const TEMPLATE_OPEN: &str = "{{";
const TEMPLATE_CLOSE: &str = "}}";
const LINK_OPEN: &str = "[[";
const LINK_CLOSE: &str = "]]";
const FIELD_SEPARATOR: char = '|';
const DISPLAY_SEPARATOR: char = '|';

/// Resolve templates, then wikilinks
pub fn resolve(text: &str, config: &ExtractionConfig) -> ResolvedText {
    resolve_links(&resolve_templates(text, config))
}

// ─────────────────────────────────────────────────────────────────────────────
// Pass 1: templates
// ─────────────────────────────────────────────────────────────────────────────

/// Rewrites `{{...}}` spans in place.
///
/// `floor` only moves forward, past closers that have no opener after the
/// previous floor. Every replacement is shorter than the span it replaces,
/// so the number of steps is at most the input length.
///
/// Each step rescans from `floor`, so k templates cost O(k·n). Extractors
/// resolve one line at a time, which keeps n small.
struct TemplatePass<'c> {
    buf: String,
    floor: usize,
    budget: usize,
    config: &'c ExtractionConfig,
}

impl<'c> TemplatePass<'c> {
    fn new(text: &str, config: &'c ExtractionConfig) -> Self {
        TemplatePass {
            buf: text.to_string(),
            floor: 0,
            budget: text.len() + 1,
            config,
        }
    }

    fn run(mut self) -> String {
        while self.step() {}
        self.buf
    }

    /// Resolve one span. Returns false when nothing more can be resolved.
    fn step(&mut self) -> bool {
        if self.budget == 0 {
            trace!(len = self.buf.len(), "template budget exhausted");
            return false;
        }
        self.budget -= 1;

        let Some(close) = self.buf[self.floor..].find(TEMPLATE_CLOSE).map(|i| self.floor + i) else {
            if self.buf[self.floor..].contains(TEMPLATE_OPEN) {
                trace!(at = self.floor, "unterminated template, leaving remainder as-is");
            }
            return false;
        };

        match self.buf[self.floor..close].rfind(TEMPLATE_OPEN) {
            Some(rel) => {
                let open = self.floor + rel;
                let interior = &self.buf[open + TEMPLATE_OPEN.len()..close];
                let replacement = resolve_template(interior, self.config);
                self.buf
                    .replace_range(open..close + TEMPLATE_CLOSE.len(), &replacement);
            }
            None => {
                // Stray closer
                self.floor = close + TEMPLATE_CLOSE.len();
            }
        }
        true
    }
}

/// Replacement text for one template interior
fn resolve_template(interior: &str, config: &ExtractionConfig) -> String {
    if !interior.contains(FIELD_SEPARATOR) {
        return interior.to_string();
    }

    let mut fields = interior.split(FIELD_SEPARATOR);
    let name = fields.next().unwrap_or_default().trim();
    if !config.is_transparent(name) {
        return String::new();
    }

    match fields.next().map(str::trim) {
        Some(param) if !param.is_empty() => format!("{}: {}", name, param),
        _ => name.to_string(),
    }
}

/// Template pass on its own
pub fn resolve_templates(text: &str, config: &ExtractionConfig) -> String {
    if !text.contains(TEMPLATE_OPEN) {
        return text.to_string();
    }
    TemplatePass::new(text, config).run()
}

// ─────────────────────────────────────────────────────────────────────────────
// Pass 2: wikilinks
// ─────────────────────────────────────────────────────────────────────────────

/// Forward-only cursor over the template-free text
struct LinkScanner<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> LinkScanner<'a> {
    fn new(text: &'a str) -> Self {
        LinkScanner { text, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    /// Emit the next text run and link into `out`. Returns false at the end
    /// of input or at an unmatched opener.
    fn step(&mut self, out: &mut ResolvedText) -> bool {
        let rest = self.rest();
        let Some(open) = rest.find(LINK_OPEN) else {
            out.push_text(rest);
            self.pos = self.text.len();
            return false;
        };

        let after_open = open + LINK_OPEN.len();
        let Some(close) = rest[after_open..].find(LINK_CLOSE).map(|i| after_open + i) else {
            trace!(at = self.pos + open, "unterminated wikilink, leaving remainder as-is");
            out.push_text(rest);
            self.pos = self.text.len();
            return false;
        };

        // Innermost opener before the closer
        let open = open + rest[open..close].rfind(LINK_OPEN).unwrap_or(0);
        out.push_text(&rest[..open]);
        out.push_cross_reference(parse_link(&rest[open + LINK_OPEN.len()..close]));

        self.pos += close + LINK_CLOSE.len();
        true
    }
}

fn parse_link(interior: &str) -> CrossReferenceLabel {
    match interior.split_once(DISPLAY_SEPARATOR) {
        Some((target, display)) => CrossReferenceLabel::new(target, display),
        None => CrossReferenceLabel::new(interior, interior),
    }
}

/// Wikilink pass on its own
pub fn resolve_links(text: &str) -> ResolvedText {
    let mut out = ResolvedText::new();
    let mut scanner = LinkScanner::new(text);
    while scanner.step(&mut out) {}
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Segment;

    fn templates(text: &str) -> String {
        resolve_templates(text, &ExtractionConfig::default())
    }

    fn link(target: &str, display: &str) -> Segment {
        Segment::CrossReference(CrossReferenceLabel::new(target, display))
    }

    fn text(s: &str) -> Segment {
        Segment::Text(s.to_string())
    }

    // ─────────────────────────────────────────────────────────────
    // Template pass
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn template_without_separator_yields_interior() {
        assert_eq!(templates("{{zool}}"), "zool");
        assert_eq!(templates("a {{pot.}} b"), "a pot. b");
    }

    #[test]
    fn transparent_template_shows_name_and_parameter() {
        assert_eq!(templates("{{forma|X}}"), "forma: X");
        assert_eq!(templates("{{synonim| kocur |2}}"), "synonim: kocur");
        assert_eq!(templates("{{dokonany od|robić}}"), "dokonany od: robić");
    }

    #[test]
    fn transparent_template_without_parameter_shows_name() {
        assert_eq!(templates("{{antonim|}}"), "antonim");
    }

    #[test]
    fn unknown_template_is_removed() {
        assert_eq!(templates("{{unknown|a|b}}"), "");
        assert_eq!(templates("x{{lp|pl}}y"), "xy");
    }

    #[test]
    fn multiple_templates_are_all_resolved() {
        assert_eq!(templates("{{zool}} {{forma|kot}} {{x|y}}!"), "zool forma: kot !");
    }

    #[test]
    fn nested_template_resolves_innermost_first() {
        assert_eq!(templates("{{forma|{{pot.}}}}"), "forma: pot.");
        assert_eq!(templates("{{ref|{{x|y}}}}"), "");
    }

    #[test]
    fn unterminated_template_leaves_remainder() {
        assert_eq!(templates("{{zool}} kot {{lp"), "zool kot {{lp");
        assert_eq!(templates("kot {{a|b"), "kot {{a|b");
    }

    #[test]
    fn stray_closer_is_skipped() {
        assert_eq!(templates("a}} {{b}}"), "a}} b");
    }

    #[test]
    fn pathological_unterminated_input_halts() {
        let input = "{{a|".repeat(50_000);
        assert_eq!(templates(&input), input);
    }

    #[test]
    fn pathological_deep_nesting_terminates() {
        let input = format!("{}{}", "{{".repeat(1_000), "}}".repeat(1_000));
        assert_eq!(templates(&input), "");
    }

    #[test]
    fn text_without_templates_is_untouched() {
        assert_eq!(templates("zwykły tekst | z kreską"), "zwykły tekst | z kreską");
    }

    // ─────────────────────────────────────────────────────────────
    // Wikilink pass
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn piped_link_splits_target_and_display() {
        let out = resolve_links("[[kot|koty]]");
        assert_eq!(out.segments(), &[link("kot", "koty")]);
    }

    #[test]
    fn bare_link_uses_content_for_both() {
        let out = resolve_links("[[kot]]");
        assert_eq!(out.segments(), &[link("kot", "kot")]);
    }

    #[test]
    fn links_interleave_with_text() {
        let out = resolve_links("mały [[kot]] i [[pies|psy]].");
        assert_eq!(
            out.segments(),
            &[text("mały "), link("kot", "kot"), text(" i "), link("pies", "psy"), text(".")]
        );
        assert_eq!(out.plain(), "mały kot i psy.");
    }

    #[test]
    fn extra_pipes_stay_in_display() {
        let out = resolve_links("[[a|b|c]]");
        assert_eq!(out.segments(), &[link("a", "b|c")]);
    }

    #[test]
    fn unterminated_link_leaves_remainder() {
        let out = resolve_links("[[kot]] i [[pies");
        assert_eq!(out.segments(), &[link("kot", "kot"), text(" i [[pies")]);
    }

    #[test]
    fn pathological_unterminated_links_halt() {
        let input = "[[".repeat(100_000);
        let out = resolve_links(&input);
        assert_eq!(out.plain(), input);
    }

    #[test]
    fn empty_input_resolves_to_empty() {
        assert!(resolve("", &ExtractionConfig::default()).is_empty());
    }

    // ─────────────────────────────────────────────────────────────
    // Both passes
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn templates_resolve_before_links() {
        let out = resolve("{{zool}} [[ssak]] z rodziny [[kotowate|kotowatych]]{{r|1}}", &ExtractionConfig::default());
        assert_eq!(out.plain(), "zool ssak z rodziny kotowatych");
        let targets: Vec<_> = out.cross_references().map(|l| l.target_key.as_str()).collect();
        assert_eq!(targets, vec!["ssak", "kotowate"]);
    }

    #[test]
    fn link_inside_transparent_template_survives() {
        let out = resolve("{{synonim|[[kocur]]}}", &ExtractionConfig::default());
        assert_eq!(out.segments(), &[text("synonim: "), link("kocur", "kocur")]);
    }
}
