use crate::models::SectorEntry;
use std::fmt::Write as _;

/// Sector block for the prompt: icon, bold name, signed change, then headlines.
pub fn render_sectors<'a>(sectors: impl IntoIterator<Item = &'a SectorEntry>) -> String {
    let mut out = String::new();
    for s in sectors {
        let icon = if s.percent_change > 0.0 { "🔥" } else { "❄️" };
        let _ = writeln!(out, "{} **{}** ({:+.2}%)", icon, s.name, s.percent_change);
        out.push_str("News:\n");
        for n in &s.news {
            let _ = writeln!(out, "- [{}]({})", n.title, n.url);
        }
        out.push('\n');
    }
    out
}

/// Full request text for the morning briefing. Pure: no I/O.
pub fn build_prompt(macro_text: &str, sector_text: &str, discussion_text: &str, language: &str) -> String {
    format!(
        "You are a veteran Wall Street analyst.
Using the market data below, write a 'Morning Briefing' for investors.

[Macro Indicators]
{macro_text}
[Key Sectors & News]
{sector_text}
[Trending Discussions (Investment Community)]
{discussion_text}

[Requirements]
1. **Market overview**: sum up today's market mood in one line (with an emoji).
2. **Macro analysis**: explain how moves in rates, oil and the dollar affected the market.
3. **Sector focus**: pick the 2-3 most notable sectors (up or down) and explain the move through sector-wide issues (regulation, commodities, trends) rather than single stocks.
4. **Community hot topics**: using 'Trending Discussions', summarise in 1-2 lines what retail investors care about or argue over right now.
5. **Investment insight**: advise which sectors to watch tomorrow or which issues to be careful about.
6. Tone: professional but plain and concise, in bullet points. Write in {language}.
"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewsItem;

    #[test]
    fn sector_block_format() {
        let sectors = vec![
            SectorEntry {
                ticker: "XLK".into(),
                name: "Technology".into(),
                percent_change: 2.1,
                news: vec![NewsItem { title: "AI capex".into(), url: "https://n/1".into() }],
            },
            SectorEntry {
                ticker: "XLE".into(),
                name: "Energy".into(),
                percent_change: -3.4,
                news: vec![],
            },
        ];
        assert_eq!(
            render_sectors(&sectors),
            "🔥 **Technology** (+2.10%)\nNews:\n- [AI capex](https://n/1)\n\n❄️ **Energy** (-3.40%)\nNews:\n\n"
        );
    }

    #[test]
    fn prompt_embeds_all_sections() {
        let p = build_prompt("S&P 500: 5000.00 (🔺 +1.00%)\n", "🔥 **Technology** (+2.10%)\n", "- [t](u)", "English");
        let macro_at = p.find("[Macro Indicators]\nS&P 500").unwrap();
        let sectors_at = p.find("[Key Sectors & News]\n🔥 **Technology**").unwrap();
        let talk_at = p.find("[Trending Discussions (Investment Community)]\n- [t](u)").unwrap();
        assert!(macro_at < sectors_at && sectors_at < talk_at);
        assert!(p.contains("Write in English."));
    }
}
