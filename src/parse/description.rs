//! Opmaak van algoritmebeschrijvingen voor tooltips.

/// Maximaal aantal tekens van een beschrijving.
pub const MAX_DESCRIPTION_LENGTH: usize = 300;
/// Maximaal aantal tekens per regel.
pub const MAX_ROW_LENGTH: usize = 60;
const MAX_LINES: usize = MAX_DESCRIPTION_LENGTH / MAX_ROW_LENGTH;
const ELLIPSIS: &str = "...";

/// Breekt een beschrijving greedy af op woordgrenzen.
///
/// Er komen hooguit [`MAX_LINES`] regels uit. Wordt dat maximum bereikt, dan
/// verliest de laatste regel drie tekens en krijgt hij `...` als suffix.
#[must_use]
pub fn wrap_description(text: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if lines.len() == MAX_LINES {
            break;
        }
        let word = fit_word(word);
        let needed = if current.is_empty() {
            char_len(&word)
        } else {
            char_len(&current) + 1 + char_len(&word)
        };
        if needed <= MAX_ROW_LENGTH {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&word);
        } else {
            lines.push(std::mem::take(&mut current));
            current = word;
        }
    }

    if !current.is_empty() && lines.len() < MAX_LINES {
        lines.push(current);
    }

    if lines.len() == MAX_LINES {
        if let Some(last) = lines.last_mut() {
            *last = with_ellipsis(last);
        }
    }
    lines
}

/// Eerste regel, ingekort met `...`, voor een ingeklapt paneel.
#[must_use]
pub fn collapsed(lines: &[String]) -> String {
    lines.first().map(|line| with_ellipsis(line)).unwrap_or_default()
}

fn with_ellipsis(line: &str) -> String {
    let keep = char_len(line).saturating_sub(ELLIPSIS.len());
    let mut shortened: String = line.chars().take(keep).collect();
    shortened.push_str(ELLIPSIS);
    shortened
}

// Een woord dat op zichzelf al te lang is wordt afgekapt in plaats van over
// regels verdeeld.
fn fit_word(word: &str) -> String {
    if char_len(word) <= MAX_ROW_LENGTH {
        word.to_owned()
    } else {
        let mut cut: String = word.chars().take(MAX_ROW_LENGTH - ELLIPSIS.len()).collect();
        cut.push_str(ELLIPSIS);
        cut
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_stays_on_one_line() {
        assert_eq!(wrap_description("Computes the area."), vec!["Computes the area."]);
        assert!(wrap_description("   ").is_empty());
    }

    #[test]
    fn lines_never_exceed_row_length_or_split_words() {
        let text = "Segments a triangulated surface mesh into parts using the shape diameter \
                    function and a graph cut with a configurable number of clusters and a \
                    smoothness factor controlling how strongly neighbouring faces attract.";
        let lines = wrap_description(text);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(line.chars().count() <= MAX_ROW_LENGTH, "te lange regel: {line}");
        }
        let rejoined = lines.join(" ");
        let original: Vec<&str> = text.split_whitespace().collect();
        assert_eq!(rejoined.split_whitespace().collect::<Vec<_>>(), original);
    }

    #[test]
    fn budget_overflow_ends_with_ellipsis() {
        let text = "word ".repeat(200);
        let lines = wrap_description(&text);
        assert_eq!(lines.len(), MAX_LINES);
        let last = lines.last().expect("laatste regel");
        assert!(last.ends_with("..."));
        assert!(last.chars().count() <= MAX_ROW_LENGTH);
    }

    #[test]
    fn collapsed_view_shortens_first_line() {
        let lines = vec!["Computes the area.".to_owned()];
        assert_eq!(collapsed(&lines), "Computes the ar...");
        assert_eq!(collapsed(&[]), "");
    }

    #[test]
    fn oversized_word_is_cut() {
        let word = "x".repeat(80);
        let lines = wrap_description(&word);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].chars().count(), MAX_ROW_LENGTH);
    }
}
