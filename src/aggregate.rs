use futures::future::join_all;

use crate::extract::{extract_text, truncate_chars};

const SEPARATOR: &str = "\n\n";

/// Crawl every URL concurrently and fold the results into one context string.
///
/// Results keep input order regardless of completion order. An empty return
/// means no URL produced usable text.
pub async fn aggregate_context(
    client: &reqwest::Client,
    urls: &[String],
    max_page_chars: usize,
    max_context_chars: usize,
) -> String {
    let pages = join_all(
        urls.iter()
            .map(|url| extract_text(client, url, max_page_chars)),
    )
    .await;

    let succeeded = pages.iter().filter(|p| !p.is_empty()).count();
    tracing::info!("crawled {}/{} urls successfully", succeeded, urls.len());

    join_pages(pages, max_context_chars)
}

/// Join non-empty pages with a blank line and cap the result.
pub fn join_pages<I>(pages: I, max_chars: usize) -> String
where
    I: IntoIterator<Item = String>,
{
    let joined = pages
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(SEPARATOR);
    truncate_chars(&joined, max_chars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::extract::crawl_client;

    fn page(body: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_raw(
            format!("<html><body><article>{}</article></body></html>", body),
            "text/html",
        )
    }

    #[test]
    fn join_skips_empty_pages_and_keeps_order() {
        let joined = join_pages(
            vec!["first".to_string(), String::new(), "second".to_string()],
            100,
        );
        assert_eq!(joined, "first\n\nsecond");
    }

    #[test]
    fn join_caps_total_length() {
        let joined = join_pages(vec!["aaaa".to_string(), "bbbb".to_string()], 7);
        assert_eq!(joined, "aaaa\n\nb");
    }

    #[test]
    fn join_of_nothing_is_empty() {
        assert_eq!(join_pages(Vec::<String>::new(), 10), "");
        assert_eq!(join_pages(vec![String::new(), String::new()], 10), "");
    }

    #[tokio::test]
    async fn keeps_input_order_despite_completion_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(page("slow page").set_delay(Duration::from_millis(300)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/fast"))
            .respond_with(page("fast page"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = crawl_client(Duration::from_secs(2), false).unwrap();
        let urls = vec![
            format!("{}/slow", server.uri()),
            format!("{}/gone", server.uri()),
            format!("{}/fast", server.uri()),
        ];
        let context = aggregate_context(&client, &urls, 2000, 5000).await;
        assert_eq!(context, "slow page\n\nfast page");
    }

    #[tokio::test]
    async fn all_failures_give_empty_context() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = crawl_client(Duration::from_secs(2), false).unwrap();
        let urls = vec![format!("{}/a", server.uri()), "not-a-url".to_string()];
        assert_eq!(aggregate_context(&client, &urls, 2000, 5000).await, "");
    }
}
