//! End-to-end pipeline tests against a local mock server

use std::path::PathBuf;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use wit::config::{
    CrawlConfig, MarkdownConfig, MetadataConfig, PagesConfig, ScrapingConfig, SelectorConfig,
    SiteConfig,
};
use wit::fetch::FetchClient;
use wit::sync::{sync_site, write_changes, FailureKind};
use wit::FetchStatus;

fn test_site(server: &MockServer, output_dir: PathBuf) -> SiteConfig {
    SiteConfig {
        name: "test".to_string(),
        base_url: Url::parse(&server.uri()).unwrap(),
        output_dir,
        pages: PagesConfig::default(),
        selectors: SelectorConfig::default(),
        scraping: ScrapingConfig {
            delay: 0.0,
            timeout: 5,
            ..ScrapingConfig::default()
        },
        markdown: MarkdownConfig::default(),
        metadata: MetadataConfig::default(),
    }
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<html><head><title>{title}</title></head>\
         <body><nav><a href=\"/\">Home</a></nav>\
         <main><h1>{title}</h1>{body}</main>\
         <footer>Footer</footer></body></html>"
    )
}

async fn mount_page(server: &MockServer, route: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_sync_two_pages_then_idempotent() {
    let server = MockServer::start().await;
    mount_page(&server, "/", page("Home", "<p>Welcome home.</p>")).await;
    mount_page(&server, "/about", page("About", "<p>About us.</p>")).await;

    let dir = TempDir::new().unwrap();
    let mut site = test_site(&server, dir.path().to_path_buf());
    site.pages.urls = vec!["/".to_string(), "/about".to_string()];

    let mut client = FetchClient::new(&site.scraping).unwrap();
    let report = sync_site(&site, &mut client).await.unwrap();

    assert_eq!(report.decisions.len(), 2);
    assert!(report.failures.is_empty());
    assert!(report.decisions.iter().all(|d| d.changed));
    assert_eq!(report.decisions[0].path, dir.path().join("index.md"));
    assert_eq!(report.decisions[1].path, dir.path().join("about.md"));

    let written = write_changes(&report).unwrap();
    assert_eq!(written.len(), 2);

    let index = std::fs::read_to_string(dir.path().join("index.md")).unwrap();
    assert!(index.starts_with("---\n"));
    assert!(index.contains("title: \"Home\""));
    assert!(index.contains("# Home"));
    assert!(index.contains("Welcome home."));
    // Boilerplate is pruned
    assert!(!index.contains("Footer"));

    // A second run sees identical content; only the timestamp would differ
    let mut client = FetchClient::new(&site.scraping).unwrap();
    let report = sync_site(&site, &mut client).await.unwrap();
    assert_eq!(report.decisions.len(), 2);
    assert_eq!(report.changed_count(), 0);
    assert!(write_changes(&report).unwrap().is_empty());
}

#[tokio::test]
async fn test_crawl_respects_max_depth() {
    let server = MockServer::start().await;
    mount_page(&server, "/", page("Home", "<p><a href=\"/a\">A</a></p>")).await;
    mount_page(&server, "/a", page("A", "<p><a href=\"/b\">B</a></p>")).await;

    // /b must never be requested
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page("B", "")))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut site = test_site(&server, dir.path().to_path_buf());
    site.pages.crawl = Some(CrawlConfig {
        max_depth: 1,
        ..CrawlConfig::default()
    });

    let mut client = FetchClient::new(&site.scraping).unwrap();
    let report = sync_site(&site, &mut client).await.unwrap();

    let paths: Vec<&str> = report.decisions.iter().map(|d| d.url.path()).collect();
    assert_eq!(paths, vec!["/", "/a"]);
}

#[tokio::test]
async fn test_crawl_exclude_patterns() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        page(
            "Home",
            "<p><a href=\"/docs/intro\">Docs</a> <a href=\"/admin/panel\">Admin</a></p>",
        ),
    )
    .await;
    mount_page(&server, "/docs/intro", page("Intro", "<p>Docs.</p>")).await;

    let dir = TempDir::new().unwrap();
    let mut site = test_site(&server, dir.path().to_path_buf());
    site.pages.crawl = Some(CrawlConfig {
        exclude: vec!["/admin/*".to_string()],
        ..CrawlConfig::default()
    });

    let mut client = FetchClient::new(&site.scraping).unwrap();
    let report = sync_site(&site, &mut client).await.unwrap();

    let paths: Vec<&str> = report.decisions.iter().map(|d| d.url.path()).collect();
    assert_eq!(paths, vec!["/", "/docs/intro"]);
}

#[tokio::test]
async fn test_glob_entry_expands_listing_links() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/blog/",
        page(
            "Blog",
            "<p><a href=\"/blog/first\">First</a> \
             <a href=\"/blog/second\">Second</a> \
             <a href=\"/about\">About</a></p>",
        ),
    )
    .await;
    mount_page(&server, "/blog/first", page("First", "<p>One.</p>")).await;
    mount_page(&server, "/blog/second", page("Second", "<p>Two.</p>")).await;

    let dir = TempDir::new().unwrap();
    let mut site = test_site(&server, dir.path().to_path_buf());
    site.pages.urls = vec!["/blog/*".to_string()];

    let mut client = FetchClient::new(&site.scraping).unwrap();
    let report = sync_site(&site, &mut client).await.unwrap();

    // Only listing links matching the pattern become targets
    let paths: Vec<&str> = report.decisions.iter().map(|d| d.url.path()).collect();
    assert_eq!(paths, vec!["/blog/first", "/blog/second"]);
    assert!(report.failures.is_empty());
}

#[tokio::test]
async fn test_failed_glob_source_degrades_to_warning() {
    let server = MockServer::start().await;
    mount_page(&server, "/", page("Home", "<p>Home.</p>")).await;
    // /missing/ has no mock, so the listing fetch 404s

    let dir = TempDir::new().unwrap();
    let mut site = test_site(&server, dir.path().to_path_buf());
    site.pages.urls = vec!["/".to_string(), "/missing/*".to_string()];

    let mut client = FetchClient::new(&site.scraping).unwrap();
    let report = sync_site(&site, &mut client).await.unwrap();

    let paths: Vec<&str> = report.decisions.iter().map(|d| d.url.path()).collect();
    assert_eq!(paths, vec!["/"]);
    assert!(report.failures.is_empty());
    assert!(report.warnings.iter().any(|w| w.contains("/missing/*")));
}

#[tokio::test]
async fn test_client_reuse_fetches_robots_once_across_sites() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nAllow: /"))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/", page("Home", "<p>Home.</p>")).await;
    mount_page(&server, "/about", page("About", "<p>About.</p>")).await;

    let dir_a = TempDir::new().unwrap();
    let mut site_a = test_site(&server, dir_a.path().to_path_buf());
    site_a.pages.urls = vec!["/".to_string()];

    let dir_b = TempDir::new().unwrap();
    let mut site_b = test_site(&server, dir_b.path().to_path_buf());
    site_b.name = "other".to_string();
    site_b.pages.urls = vec!["/about".to_string()];

    let mut client = FetchClient::new(&site_a.scraping).unwrap();
    let report = sync_site(&site_a, &mut client).await.unwrap();
    assert_eq!(report.decisions.len(), 1);

    // The carried-over client already holds this origin's robots policy
    let mut client = client.for_site(&site_b.scraping).unwrap();
    let report = sync_site(&site_b, &mut client).await.unwrap();
    assert_eq!(report.decisions.len(), 1);
}

#[tokio::test]
async fn test_server_error_exhausts_retry_budget() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut site = test_site(&server, dir.path().to_path_buf());
    site.pages.urls = vec!["/flaky".to_string()];

    let mut client = FetchClient::new(&site.scraping).unwrap();
    let report = sync_site(&site, &mut client).await.unwrap();

    assert!(report.decisions.is_empty());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(
        report.failures[0].kind,
        FailureKind::Fetch(FetchStatus::ServerError)
    );
}

#[tokio::test]
async fn test_not_found_fails_without_retry() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut site = test_site(&server, dir.path().to_path_buf());
    site.pages.urls = vec!["/gone".to_string()];

    let mut client = FetchClient::new(&site.scraping).unwrap();
    let report = sync_site(&site, &mut client).await.unwrap();

    assert_eq!(
        report.failures[0].kind,
        FailureKind::Fetch(FetchStatus::NotFound)
    );
}

#[tokio::test]
async fn test_rate_limited_then_recovers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(
            ResponseTemplate::new(429).insert_header("Retry-After", "0"),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_page(&server, "/busy", page("Busy", "<p>Served.</p>")).await;

    let dir = TempDir::new().unwrap();
    let mut site = test_site(&server, dir.path().to_path_buf());
    site.pages.urls = vec!["/busy".to_string()];

    let mut client = FetchClient::new(&site.scraping).unwrap();
    let report = sync_site(&site, &mut client).await.unwrap();

    assert!(report.failures.is_empty());
    assert_eq!(report.decisions.len(), 1);
    assert!(report.decisions[0].content.contains("Served."));
}

#[tokio::test]
async fn test_robots_disallow_skips_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private"),
        )
        .mount(&server)
        .await;
    mount_page(&server, "/", page("Home", "<p>Public.</p>")).await;

    // The disallowed page must never be requested
    Mock::given(method("GET"))
        .and(path("/private"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page("Private", "")))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut site = test_site(&server, dir.path().to_path_buf());
    site.pages.urls = vec!["/".to_string(), "/private".to_string()];

    let mut client = FetchClient::new(&site.scraping).unwrap();
    let report = sync_site(&site, &mut client).await.unwrap();

    assert_eq!(report.decisions.len(), 1);
    assert_eq!(report.decisions[0].url.path(), "/");
    assert_eq!(report.failures.len(), 1);
    assert_eq!(
        report.failures[0].kind,
        FailureKind::Fetch(FetchStatus::RobotsDisallowed)
    );
}

#[tokio::test]
async fn test_missing_content_is_isolated_per_page() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/good",
        "<html><body><div id=\"content\"><p>Found.</p></div></body></html>".to_string(),
    )
    .await;
    mount_page(
        &server,
        "/bad",
        "<html><body><p>No content div.</p></body></html>".to_string(),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let mut site = test_site(&server, dir.path().to_path_buf());
    site.pages.urls = vec!["/good".to_string(), "/bad".to_string()];
    site.selectors.content = vec!["#content".to_string()];

    let mut client = FetchClient::new(&site.scraping).unwrap();
    let report = sync_site(&site, &mut client).await.unwrap();

    assert_eq!(report.decisions.len(), 1);
    assert_eq!(report.decisions[0].url.path(), "/good");
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].kind, FailureKind::NoContent);
}

#[tokio::test]
async fn test_sitemap_discovery_keeps_document_order() {
    let server = MockServer::start().await;

    let sitemap = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>{0}/guide</loc></url>
  <url><loc>{0}/</loc></url>
  <url><loc>https://elsewhere.example/skip</loc></url>
</urlset>"#,
        server.uri()
    );

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sitemap))
        .mount(&server)
        .await;
    mount_page(&server, "/guide", page("Guide", "<p>Guide.</p>")).await;
    mount_page(&server, "/", page("Home", "<p>Home.</p>")).await;

    let dir = TempDir::new().unwrap();
    let mut site = test_site(&server, dir.path().to_path_buf());
    site.pages.sitemap = Some("/sitemap.xml".to_string());

    let mut client = FetchClient::new(&site.scraping).unwrap();
    let report = sync_site(&site, &mut client).await.unwrap();

    let paths: Vec<&str> = report.decisions.iter().map(|d| d.url.path()).collect();
    assert_eq!(paths, vec!["/guide", "/"]);
}

#[tokio::test]
async fn test_content_edit_detected_on_resync() {
    let server = MockServer::start().await;
    mount_page(&server, "/", page("Home", "<p>Version one.</p>")).await;

    let dir = TempDir::new().unwrap();
    let mut site = test_site(&server, dir.path().to_path_buf());
    site.pages.urls = vec!["/".to_string()];

    let mut client = FetchClient::new(&site.scraping).unwrap();
    let report = sync_site(&site, &mut client).await.unwrap();
    write_changes(&report).unwrap();

    // The page changes upstream
    server.reset().await;
    mount_page(&server, "/", page("Home", "<p>Version two.</p>")).await;

    let mut client = FetchClient::new(&site.scraping).unwrap();
    let report = sync_site(&site, &mut client).await.unwrap();

    assert_eq!(report.changed_count(), 1);
    let decision = &report.decisions[0];
    assert!(decision.content.contains("Version two."));
    assert!(decision.previous.as_ref().unwrap().contains("Version one."));
}
