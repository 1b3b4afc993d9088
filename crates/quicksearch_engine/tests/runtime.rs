use std::sync::mpsc;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use quicksearch_core::{
    FormMethod, NativeRequest, PagePhase, SearchForm, SearchProfile, SearchState,
};
use quicksearch_engine::{
    ChannelEventSink, FailureKind, MemoryPage, NullEventSink, PageDom, ReqwestTransport,
    RuntimeEvent, SearchRuntime, SearchTransport, SharedPage, SubmitError, TransportOutput,
    TransportSettings,
};
use reqwest::Url;
use tokio::time::{sleep, Instant};
use wiremock::matchers::{body_string, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

static INIT: Once = Once::new();

fn init_logging() {
    INIT.call_once(|| {
        quicksearch_logging::initialize_for_tests();
    });
}

const GLOSSARY_PAGE: &str = r#"<html><head><title>Glossary</title></head><body>
<form action="/glossary"><input name="searchTerm"><input name="sortTerm"></form>
<div id="glossary-list-container"><p id="glossary-result-count">12 terms</p>
<div id="glossary-list-content"><dl><dt>API</dt></dl></div></div></body></html>"#;

const VENDOR_PAGE: &str = r#"<html><head><title>1 error: Software vendors</title></head><body>
<div class="govuk-error-summary">There is a problem</div>
<div class="govuk-form-group govuk-form-group--error">
<p class="govuk-error-message">Enter a search term</p></div>
<div id="software-vendors"><span id="vendor-count">40</span>
<div id="software-vendor-list"><ul><li>Acme</li></ul></div></div></body></html>"#;

#[derive(Debug)]
struct RecordedPost {
    at: Instant,
    endpoint: String,
    body: String,
}

/// Answers every POST with the same fragment (or failure) and records calls.
struct ScriptedTransport {
    fragment: String,
    fail_posts: bool,
    fail_navigation: bool,
    navigation_delay: Duration,
    reloaded_page: String,
    posts: Mutex<Vec<RecordedPost>>,
    navigations: Mutex<Vec<NativeRequest>>,
}

impl ScriptedTransport {
    fn answering(fragment: &str) -> Self {
        Self {
            fragment: fragment.to_string(),
            fail_posts: false,
            fail_navigation: false,
            navigation_delay: Duration::ZERO,
            reloaded_page: "<html><head><title>Results</title></head><body></body></html>"
                .to_string(),
            posts: Mutex::new(Vec::new()),
            navigations: Mutex::new(Vec::new()),
        }
    }

    fn failing() -> Self {
        Self {
            fail_posts: true,
            ..Self::answering("")
        }
    }

    fn post_bodies(&self) -> Vec<String> {
        self.posts
            .lock()
            .unwrap()
            .iter()
            .map(|post| post.body.clone())
            .collect()
    }

    fn navigations(&self) -> Vec<NativeRequest> {
        self.navigations.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchTransport for ScriptedTransport {
    async fn post_fragment(
        &self,
        endpoint: &str,
        body: &str,
    ) -> Result<TransportOutput, SubmitError> {
        self.posts.lock().unwrap().push(RecordedPost {
            at: Instant::now(),
            endpoint: endpoint.to_string(),
            body: body.to_string(),
        });
        if self.fail_posts {
            return Err(SubmitError {
                kind: FailureKind::HttpStatus(500),
                message: "500 Internal Server Error".to_string(),
            });
        }
        Ok(output(&self.fragment, endpoint))
    }

    async fn navigate(&self, request: &NativeRequest) -> Result<TransportOutput, SubmitError> {
        self.navigations.lock().unwrap().push(request.clone());
        sleep(self.navigation_delay).await;
        if self.fail_navigation {
            return Err(SubmitError {
                kind: FailureKind::Network,
                message: "connection refused".to_string(),
            });
        }
        Ok(output(&self.reloaded_page, &request.url))
    }
}

fn output(markup: &str, url: &str) -> TransportOutput {
    TransportOutput {
        markup: markup.to_string(),
        final_url: url.to_string(),
        content_type: Some("text/html".to_string()),
        encoding_label: "UTF-8".to_string(),
    }
}

fn page(markup: &str) -> Arc<Mutex<MemoryPage>> {
    Arc::new(Mutex::new(MemoryPage::parse(markup)))
}

fn glossary_state() -> SearchState {
    SearchState::new(
        SearchProfile::glossary(),
        SearchForm::new("/glossary").with_field("searchTerm", ""),
    )
}

#[tokio::test(start_paused = true)]
async fn burst_of_keystrokes_posts_once_after_quiet_period() {
    init_logging();
    let transport = Arc::new(ScriptedTransport::answering("<dl><dt>Foo</dt></dl>"));
    let shared: SharedPage = page(GLOSSARY_PAGE);
    let handle = SearchRuntime::spawn(
        glossary_state(),
        shared,
        transport.clone(),
        Arc::new(NullEventSink),
    );

    for value in ["f", "fo", "foo"] {
        handle.text_input("searchTerm", value);
        sleep(Duration::from_millis(100)).await;
    }
    let last_event = Instant::now() - Duration::from_millis(100);
    assert!(transport.post_bodies().is_empty());

    sleep(Duration::from_secs(1)).await;

    let posts = transport.posts.lock().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].endpoint, "/glossary/ajax");
    assert_eq!(posts[0].body, "searchTerm=foo");
    let waited = posts[0].at.duration_since(last_event);
    assert!(
        waited >= Duration::from_millis(500) && waited < Duration::from_millis(505),
        "posted {waited:?} after the last keystroke"
    );
}

#[tokio::test(start_paused = true)]
async fn spaced_keystrokes_post_once_each() {
    init_logging();
    let transport = Arc::new(ScriptedTransport::answering("<dl></dl>"));
    let handle = SearchRuntime::spawn(
        glossary_state(),
        page(GLOSSARY_PAGE),
        transport.clone(),
        Arc::new(NullEventSink),
    );

    handle.text_input("searchTerm", "a");
    sleep(Duration::from_millis(600)).await;
    handle.text_input("sortTerm", "name");
    sleep(Duration::from_millis(600)).await;

    assert_eq!(
        transport.post_bodies(),
        vec!["searchTerm=a", "searchTerm=a&sortTerm=name"]
    );
    assert_eq!(handle.view().fragments_applied, 2);
}

#[tokio::test(start_paused = true)]
async fn fragment_is_spliced_into_the_page() {
    init_logging();
    let fragment =
        r#"<div><span id="updated-vendor-count">3</span><ul><li>Cloudy</li></ul></div>"#;
    let transport = Arc::new(ScriptedTransport::answering(fragment));
    let vendor_page = page(VENDOR_PAGE);
    let (tx, rx) = mpsc::channel();
    let state = SearchState::new(
        SearchProfile::vendor(),
        SearchForm::new("/software-vendors").with_field("searchTerm", ""),
    );
    let handle = SearchRuntime::spawn(
        state,
        vendor_page.clone(),
        transport.clone(),
        Arc::new(ChannelEventSink::new(tx)),
    );

    handle.checkbox_clicked("category", "hosting", true);
    sleep(Duration::from_secs(1)).await;

    assert_eq!(
        transport.post_bodies(),
        vec!["searchTerm=&category=hosting"]
    );
    {
        let page = vendor_page.lock().unwrap();
        assert_eq!(page.inner_html("vendor-count").as_deref(), Some("3"));
        assert_eq!(
            page.inner_html("software-vendor-list").as_deref(),
            Some(fragment)
        );
        assert!(!page.has_class("software-vendors", "loading"));
        assert_eq!(
            page.style("software-vendor-list", "opacity").as_deref(),
            Some("1")
        );
        assert_eq!(page.title(), "Software vendors");
        assert!(!page.to_html().contains("govuk-error"));
    }

    let events: Vec<RuntimeEvent> = rx.try_iter().collect();
    assert!(matches!(events[0], RuntimeEvent::Scheduled { .. }));
    assert_eq!(
        events[1..].to_vec(),
        vec![
            RuntimeEvent::Posted {
                request_id: 1,
                endpoint: "/software-vendors/ajax".to_string(),
            },
            RuntimeEvent::FragmentApplied {
                request_id: 1,
                status_updated: true,
            },
        ]
    );

    let view = handle.view();
    assert!(!view.loading);
    assert!(view.in_flight.is_empty());
    assert_eq!(view.submissions, 1);
}

#[tokio::test(start_paused = true)]
async fn failed_post_falls_back_to_native_submission_once() {
    init_logging();
    let transport = Arc::new(ScriptedTransport::failing());
    let glossary_page = page(GLOSSARY_PAGE);
    let (tx, rx) = mpsc::channel();
    let handle = SearchRuntime::spawn(
        glossary_state(),
        glossary_page.clone(),
        transport.clone(),
        Arc::new(ChannelEventSink::new(tx)),
    );

    handle.text_input("searchTerm", "foo");
    sleep(Duration::from_secs(2)).await;

    assert_eq!(transport.post_bodies(), vec!["searchTerm=foo"]);
    assert_eq!(
        transport.navigations(),
        vec![NativeRequest {
            method: FormMethod::Get,
            url: "/glossary?searchTerm=foo".to_string(),
            body: None,
        }]
    );
    assert_eq!(glossary_page.lock().unwrap().title(), "Results");

    let events: Vec<RuntimeEvent> = rx.try_iter().collect();
    assert!(events.contains(&RuntimeEvent::FellBack {
        request_id: 1,
        kind: FailureKind::HttpStatus(500),
    }));
    assert!(events.contains(&RuntimeEvent::Navigated {
        url: "/glossary?searchTerm=foo".to_string(),
    }));

    let view = handle.view();
    assert_eq!(view.phase, PagePhase::Interactive);
    assert_eq!(view.fallbacks, 1);
}

#[tokio::test(start_paused = true)]
async fn input_during_navigation_is_dropped() {
    init_logging();
    let transport = Arc::new(ScriptedTransport {
        navigation_delay: Duration::from_secs(5),
        ..ScriptedTransport::failing()
    });
    let handle = SearchRuntime::spawn(
        glossary_state(),
        page(GLOSSARY_PAGE),
        transport.clone(),
        Arc::new(NullEventSink),
    );

    handle.text_input("searchTerm", "foo");
    sleep(Duration::from_millis(600)).await;
    assert_eq!(handle.view().phase, PagePhase::Navigating);

    handle.text_input("searchTerm", "bar");
    sleep(Duration::from_secs(1)).await;

    assert_eq!(transport.post_bodies(), vec!["searchTerm=foo"]);
    assert_eq!(transport.navigations().len(), 1);
    assert_eq!(handle.view().query, "searchTerm=foo");
}

#[tokio::test(start_paused = true)]
async fn failed_navigation_leaves_a_settled_page() {
    init_logging();
    let transport = Arc::new(ScriptedTransport {
        fail_navigation: true,
        ..ScriptedTransport::failing()
    });
    let glossary_page = page(GLOSSARY_PAGE);
    let (tx, rx) = mpsc::channel();
    let handle = SearchRuntime::spawn(
        glossary_state(),
        glossary_page.clone(),
        transport.clone(),
        Arc::new(ChannelEventSink::new(tx)),
    );

    handle.text_input("searchTerm", "foo");
    sleep(Duration::from_secs(2)).await;
    assert!(handle.flush().await);

    let events: Vec<RuntimeEvent> = rx.try_iter().collect();
    assert!(events.contains(&RuntimeEvent::NavigationFailed {
        url: "/glossary?searchTerm=foo".to_string(),
        kind: FailureKind::Network,
    }));
    let view = handle.view();
    assert_eq!(view.phase, PagePhase::Stranded);
    assert!(!view.loading);
    assert_eq!(view.pending_ticket, None);
    assert!(view.in_flight.is_empty());
    // The old document is still there.
    assert_eq!(glossary_page.lock().unwrap().title(), "Glossary");

    handle.text_input("searchTerm", "bar");
    sleep(Duration::from_secs(2)).await;
    assert_eq!(transport.post_bodies(), vec!["searchTerm=foo"]);
    assert_eq!(transport.navigations().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn shutdown_discards_pending_submission() {
    init_logging();
    let transport = Arc::new(ScriptedTransport::answering("<dl></dl>"));
    let handle = SearchRuntime::spawn(
        glossary_state(),
        page(GLOSSARY_PAGE),
        transport.clone(),
        Arc::new(NullEventSink),
    );

    handle.text_input("searchTerm", "foo");
    sleep(Duration::from_millis(100)).await;
    handle.shutdown().await;
    sleep(Duration::from_secs(1)).await;

    assert!(transport.post_bodies().is_empty());
}

#[tokio::test]
async fn typing_against_a_live_server_posts_the_final_query() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search/ajax"))
        .and(body_string("searchTerm=foo"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("<dl><dt>foo</dt></dl>", "text/html"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new(TransportSettings {
        base_url: Some(Url::parse(&server.uri()).unwrap()),
        ..TransportSettings::default()
    })
    .unwrap();
    let glossary_page = page(GLOSSARY_PAGE);
    let state = SearchState::new(
        SearchProfile::glossary(),
        SearchForm::new("/search").with_field("searchTerm", ""),
    );
    let handle = SearchRuntime::spawn(
        state,
        glossary_page.clone(),
        Arc::new(transport),
        Arc::new(NullEventSink),
    );

    handle.text_input("searchTerm", "f");
    handle.text_input("searchTerm", "fo");
    handle.text_input("searchTerm", "foo");

    let mut view = handle.watch_view();
    tokio::time::timeout(Duration::from_secs(5), async {
        while view.borrow_and_update().fragments_applied == 0 {
            view.changed().await.unwrap();
        }
    })
    .await
    .expect("fragment applied");

    server.verify().await;
    assert_eq!(
        glossary_page
            .lock()
            .unwrap()
            .inner_html("glossary-list-content")
            .as_deref(),
        Some("<dl><dt>foo</dt></dl>")
    );
}
