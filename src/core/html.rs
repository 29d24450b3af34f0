use crate::domain::model::TransferRow;
use crate::utils::error::{Result, ScrapeError};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

static ANCHOR_WITH_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[title]").expect("valid selector"));

static TRANSFER_GRID: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div.tm-player-transfer-history-grid").expect("valid selector")
});

/// Collapse whitespace runs and trim. Scraped cells arrive with the page's
/// indentation and newlines embedded.
pub fn clean_text(raw: &str) -> String {
    WHITESPACE.replace_all(raw, " ").trim().to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub query: String,
    pub transfermarkt_id: u32,
}

/// First anchor whose `title` attribute exactly equals `name`, resolved to
/// (slug, id) from its href path segments. `None` when no anchor matches or
/// the matching href is malformed.
pub fn parse_search_result(html: &str, name: &str) -> Option<SearchHit> {
    let document = Html::parse_document(html);
    let anchor = document
        .select(&ANCHOR_WITH_TITLE)
        .find(|a| a.value().attr("title") == Some(name))?;
    parse_profile_href(anchor.value().attr("href")?)
}

/// Profile hrefs look like `/lionel-messi/profil/spieler/28003`:
/// segment 1 is the slug, segment 4 the numeric ID.
fn parse_profile_href(href: &str) -> Option<SearchHit> {
    let parts: Vec<&str> = href.split('/').collect();
    let query = parts.get(1)?;
    let id = parts.get(4)?.parse::<u32>().ok()?;
    if query.is_empty() {
        return None;
    }
    Some(SearchHit {
        query: query.to_string(),
        transfermarkt_id: id,
    })
}

/// Every transfer-history grid container on the page becomes one row tagged
/// with `query`. A container missing any of the six cells fails the whole
/// page parse: partial rows are worse than a skipped player.
pub fn parse_transfer_rows(html: &str, query: &str) -> Result<Vec<TransferRow>> {
    let document = Html::parse_document(html);
    let mut rows = Vec::new();

    for grid in document.select(&TRANSFER_GRID) {
        let cell = |label: &str, class: &str| -> Result<String> {
            cell_text(&grid, class).ok_or_else(|| ScrapeError::ParseError {
                message: format!("transfer grid for '{}' is missing the {} cell", query, label),
            })
        };

        rows.push(TransferRow {
            query: query.to_string(),
            season_name: cell("season", "tm-player-transfer-history-grid__season")?,
            date: cell("date", "tm-player-transfer-history-grid__date")?,
            old_club: cell("old club", "tm-player-transfer-history-grid__old-club")?,
            new_club: cell("new club", "tm-player-transfer-history-grid__new-club")?,
            market_value: cell("market value", "tm-player-transfer-history-grid__market-value")?,
            transfer_fee: cell("fee", "tm-player-transfer-history-grid__fee")?,
        });
    }

    Ok(rows)
}

fn cell_text(grid: &ElementRef, class: &str) -> Option<String> {
    let selector = Selector::parse(&format!("div.{}", class)).ok()?;
    let cell = grid.select(&selector).next()?;
    Some(clean_text(&cell.text().collect::<String>()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_PAGE: &str = r#"
        <html><body>
          <table class="items">
            <tr>
              <td><a title="Lionel Messi" href="/lionel-messi/profil/spieler/28003">Lionel Messi</a></td>
              <td><a title="Lionel Messi" href="/lionel-messi-duplicate/profil/spieler/99999">Lionel Messi</a></td>
              <td><a title="Luis Suarez" href="/luis-suarez/profil/spieler/44352">Luis Suarez</a></td>
              <td><a href="/no-title/profil/spieler/1">No Title</a></td>
            </tr>
          </table>
        </body></html>
    "#;

    #[test]
    fn test_search_exact_title_first_anchor_wins() {
        let hit = parse_search_result(SEARCH_PAGE, "Lionel Messi").unwrap();
        assert_eq!(hit.query, "lionel-messi");
        assert_eq!(hit.transfermarkt_id, 28003);
    }

    #[test]
    fn test_search_title_must_match_exactly() {
        assert!(parse_search_result(SEARCH_PAGE, "Lionel").is_none());
        assert!(parse_search_result(SEARCH_PAGE, "lionel messi").is_none());
        assert!(parse_search_result(SEARCH_PAGE, "Cristiano Ronaldo").is_none());
    }

    #[test]
    fn test_search_malformed_href_is_a_miss() {
        let page = r#"<a title="Short Href" href="/short-href">Short Href</a>"#;
        assert!(parse_search_result(page, "Short Href").is_none());

        let page = r#"<a title="Bad Id" href="/bad-id/profil/spieler/abc">Bad Id</a>"#;
        assert!(parse_search_result(page, "Bad Id").is_none());
    }

    #[test]
    fn test_clean_text_collapses_whitespace() {
        assert_eq!(clean_text("  FC\n   Barcelona \t"), "FC Barcelona");
        assert_eq!(clean_text(""), "");
    }

    fn grid(season: &str, date: &str, old: &str, new: &str, value: &str, fee: &str) -> String {
        format!(
            r#"<div class="grid tm-player-transfer-history-grid">
                <div class="grid__cell grid__cell--center tm-player-transfer-history-grid__season">{season}</div>
                <div class="grid__cell grid__cell--center tm-player-transfer-history-grid__date">{date}</div>
                <div class="grid__cell grid__cell--center tm-player-transfer-history-grid__old-club">{old}</div>
                <div class="grid__cell grid__cell--center tm-player-transfer-history-grid__new-club">{new}</div>
                <div class="grid__cell grid__cell--center tm-player-transfer-history-grid__market-value">{value}</div>
                <div class="grid__cell grid__cell--center tm-player-transfer-history-grid__fee">{fee}</div>
            </div>"#
        )
    }

    #[test]
    fn test_transfer_page_yields_one_row_per_grid() {
        let page = format!(
            "<html><body>{}{}</body></html>",
            grid("18/19", "Jul 10, 2018", "Real Madrid", "Juventus", "€100.00m", "€117.00m"),
            grid("09/10", "Jul 1, 2009", "Man Utd", "Real Madrid", "€60.00m", "€94.00m"),
        );

        let rows = parse_transfer_rows(&page, "cristiano-ronaldo").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            TransferRow {
                query: "cristiano-ronaldo".to_string(),
                season_name: "18/19".to_string(),
                date: "Jul 10, 2018".to_string(),
                old_club: "Real Madrid".to_string(),
                new_club: "Juventus".to_string(),
                market_value: "€100.00m".to_string(),
                transfer_fee: "€117.00m".to_string(),
            }
        );
        assert_eq!(rows[1].season_name, "09/10");
    }

    #[test]
    fn test_transfer_cells_are_cleaned() {
        let page = grid(
            "  18/19 ",
            "Jul 10,\n 2018",
            " Real\n   Madrid ",
            "Juventus",
            "€100.00m",
            "€117.00m",
        );

        let rows = parse_transfer_rows(&page, "cristiano-ronaldo").unwrap();
        assert_eq!(rows[0].date, "Jul 10, 2018");
        assert_eq!(rows[0].old_club, "Real Madrid");
    }

    #[test]
    fn test_transfer_page_without_grids_is_empty() {
        let rows = parse_transfer_rows("<html><body><p>no data</p></body></html>", "x").unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_missing_cell_fails_the_parse() {
        let page = r#"<div class="grid tm-player-transfer-history-grid">
            <div class="grid__cell tm-player-transfer-history-grid__season">18/19</div>
        </div>"#;

        let err = parse_transfer_rows(page, "cristiano-ronaldo").unwrap_err();
        match err {
            ScrapeError::ParseError { message } => assert!(message.contains("date")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
