//! Message formatters: typed feed results to chat text. No I/O.

use chrono::{Local, NaiveDate};

use crate::feeds::{CompanyProfile, DailyQuestion, Quote};

pub const LEETCODE_SITE_URL: &str = "https://leetcode.com";

pub const INDICATOR_UP: &str = "🟢";
pub const INDICATOR_DOWN: &str = "🔴";

/// Decoration for the known difficulty labels. Upstream labels are not a
/// closed set, so anything else gets no decoration.
pub fn difficulty_decoration(difficulty: &str) -> Option<&'static str> {
    match difficulty {
        "Easy" => Some("🟩"),
        "Medium" => Some("🟨"),
        "Hard" => Some("🟥"),
        _ => None,
    }
}

/// Problem page for a slug on the given site.
pub fn problem_url(site: &str, slug: &str) -> String {
    format!("{}/problems/{}/", site.trim_end_matches('/'), slug)
}

/// Today's date in the local timezone.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Render the daily question stamped with today's local date.
pub fn format_question(question: &DailyQuestion) -> String {
    format_question_on(question, today(), LEETCODE_SITE_URL)
}

pub fn format_question_on(question: &DailyQuestion, date: NaiveDate, site: &str) -> String {
    let difficulty = match difficulty_decoration(&question.difficulty) {
        Some(decoration) => format!("{} {}", question.difficulty, decoration),
        None => question.difficulty.clone(),
    };

    format!(
        "Date: {}\nTitle: {}\nDifficulty: {}\n{}",
        date.format("%Y-%m-%d"),
        question.title,
        difficulty,
        problem_url(site, &question.title_slug),
    )
}

/// Render a quote, enriched with the profile when one is available.
///
/// A change of exactly zero counts as "up".
pub fn format_quote(symbol: &str, quote: &Quote, profile: Option<&CompanyProfile>) -> String {
    let indicator = if quote.change >= 0.0 {
        INDICATOR_UP
    } else {
        INDICATOR_DOWN
    };

    let header = match profile.map(|p| p.name.trim()).filter(|n| !n.is_empty()) {
        Some(name) => format!("{} ({})", name, symbol),
        None => symbol.to_owned(),
    };

    let mut text = format!(
        "{} {}\n\
         💵 Current: ${:.2}\n\
         📈 Change: {:.2} ({:.2}%)\n\
         📊 Open: ${:.2} | High: ${:.2} | Low: ${:.2}\n\
         📉 Previous Close: ${:.2}",
        header,
        indicator,
        quote.current,
        quote.change,
        quote.percent_change,
        quote.open,
        quote.high,
        quote.low,
        quote.previous_close,
    );

    if let Some(profile) = profile {
        if profile.market_capitalization > 0.0 {
            // Finnhub reports millions.
            text.push_str(&format!(
                "\n🏢 Market Cap: ${:.2}B",
                profile.market_capitalization / 1000.0
            ));
        }
        if !profile.industry.is_empty() {
            text.push_str(&format!("\n🏭 Industry: {}", profile.industry));
        }
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(difficulty: &str) -> DailyQuestion {
        DailyQuestion {
            title: "Two Sum".into(),
            title_slug: "two-sum".into(),
            difficulty: difficulty.into(),
        }
    }

    fn quote(change: f64) -> Quote {
        Quote {
            current: 100.0,
            change,
            percent_change: change,
            high: 101.0,
            low: 99.0,
            open: 100.5,
            previous_close: 100.0 - change,
        }
    }

    #[test]
    fn test_known_difficulties_are_decorated() {
        for (label, decoration) in [("Easy", "🟩"), ("Medium", "🟨"), ("Hard", "🟥")] {
            let text = format_question(&question(label));
            assert!(
                text.contains(&format!("Difficulty: {} {}", label, decoration)),
                "{}",
                text
            );
        }
    }

    #[test]
    fn test_unknown_difficulty_passes_through() {
        let text = format_question(&question("Unknown"));
        assert!(text.contains("Difficulty: Unknown\n"));
        for decoration in ["🟩", "🟨", "🟥"] {
            assert!(!text.contains(decoration));
        }
        // Labels are matched exactly.
        assert_eq!(difficulty_decoration("easy"), None);
    }

    #[test]
    fn test_question_layout() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let text = format_question_on(&question("Easy"), date, LEETCODE_SITE_URL);
        assert_eq!(
            text,
            "Date: 2024-03-09\nTitle: Two Sum\nDifficulty: Easy 🟩\nhttps://leetcode.com/problems/two-sum/"
        );
    }

    #[test]
    fn test_question_contains_problem_url() {
        let mut q = question("Hard");
        q.title_slug = "median-of-two-sorted-arrays".into();
        let text = format_question(&q);
        assert!(text.contains("https://leetcode.com/problems/median-of-two-sorted-arrays/"));
    }

    #[test]
    fn test_indicator_boundary() {
        assert!(format_quote("AAPL", &quote(0.0), None).starts_with("AAPL 🟢"));
        assert!(format_quote("AAPL", &quote(1.5), None).starts_with("AAPL 🟢"));
        assert!(format_quote("AAPL", &quote(-0.01), None).starts_with("AAPL 🔴"));
    }

    #[test]
    fn test_header_uses_profile_name() {
        let profile = CompanyProfile {
            name: "Apple Inc".into(),
            ..Default::default()
        };
        let text = format_quote("AAPL", &quote(1.0), Some(&profile));
        assert!(text.starts_with("Apple Inc (AAPL) 🟢\n"));

        let unnamed = CompanyProfile::default();
        let text = format_quote("AAPL", &quote(1.0), Some(&unnamed));
        assert!(text.starts_with("AAPL 🟢\n"));
    }

    #[test]
    fn test_quote_lines() {
        let text = format_quote("MSFT", &quote(-2.5), None);
        assert_eq!(
            text,
            "MSFT 🔴\n\
             💵 Current: $100.00\n\
             📈 Change: -2.50 (-2.50%)\n\
             📊 Open: $100.50 | High: $101.00 | Low: $99.00\n\
             📉 Previous Close: $102.50"
        );
    }

    #[test]
    fn test_market_cap_line_only_when_positive() {
        let mut profile = CompanyProfile {
            name: "Apple Inc".into(),
            market_capitalization: 2_950_123.0,
            industry: "Technology".into(),
            exchange: "NASDAQ".into(),
        };
        let text = format_quote("AAPL", &quote(1.0), Some(&profile));
        assert!(text.contains("\n🏢 Market Cap: $2950.12B"));
        assert!(text.ends_with("\n🏭 Industry: Technology"));

        profile.market_capitalization = 0.0;
        profile.industry.clear();
        let text = format_quote("AAPL", &quote(1.0), Some(&profile));
        assert!(!text.contains("Market Cap"));
        assert!(!text.contains("Industry"));
    }
}
