//! CoinGecko endpoint constants and query building

/// Base URL for the CoinGecko v3 API
pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Largest page size the markets endpoint accepts
pub const MAX_PER_PAGE: u32 = 250;

/// Ranking order requested from the markets endpoint
pub const MARKET_ORDER: &str = "market_cap_desc";

/// Query for one page of `/coins/markets`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketsQuery<'a> {
    pub vs_currency: &'a str,
    pub per_page: u32,
    pub page: u32,
}

impl MarketsQuery<'_> {
    /// Full request URL against `base_url`
    pub fn url(&self, base_url: &str) -> String {
        format!(
            "{}/coins/markets?vs_currency={}&order={}&per_page={}&page={}",
            base_url, self.vs_currency, MARKET_ORDER, self.per_page, self.page
        )
    }
}

/// URL of the full coin catalog
pub fn coin_list_url(base_url: &str) -> String {
    format!("{}/coins/list", base_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markets_url() {
        let query = MarketsQuery {
            vs_currency: "usd",
            per_page: 250,
            page: 2,
        };
        assert_eq!(
            query.url(DEFAULT_BASE_URL),
            "https://api.coingecko.com/api/v3/coins/markets?vs_currency=usd&order=market_cap_desc&per_page=250&page=2"
        );
    }

    #[test]
    fn test_coin_list_url() {
        assert_eq!(
            coin_list_url("http://127.0.0.1:8080"),
            "http://127.0.0.1:8080/coins/list"
        );
    }
}
