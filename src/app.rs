use std::time::{Duration, Instant, SystemTime};

use ratatui::layout::Rect;
use tracing::{debug, info};

use crate::model::AircraftRecord;
use crate::net::{FetchDispatch, FetchResult};

pub const REFRESH_LABEL: &str = "Refresh Data";
pub const LOADING_LABEL: &str = "Loading...";

/// The aircraft panel: the latest fetch outcome plus the bits of view state
/// the terminal needs (scroll position, where the button was drawn).
pub struct App {
    pub records: Vec<AircraftRecord>,
    pub loading: bool,
    pub error: Option<String>,
    pub last_update: Option<SystemTime>,
    pub url: String,
    pub auto_refresh: Duration,
    pub scroll: usize,
    issued: u64,
    mounted: bool,
    last_refresh: Option<Instant>,
    grid_rows: usize,
    grid_visible_rows: usize,
    button_area: Option<Rect>,
}

impl App {
    pub fn new(url: String, auto_refresh: Duration) -> Self {
        Self {
            records: Vec::new(),
            loading: false,
            error: None,
            last_update: None,
            url,
            auto_refresh,
            scroll: 0,
            issued: 0,
            mounted: false,
            last_refresh: None,
            grid_rows: 0,
            grid_visible_rows: 0,
            button_area: None,
        }
    }

    /// Runs the initial fetch. Later calls do nothing.
    pub fn mount(&mut self, fetcher: &dyn FetchDispatch) {
        if self.mounted {
            return;
        }
        self.mounted = true;
        debug!("panel mounted");
        self.refresh(fetcher);
    }

    /// Starts a fetch cycle and returns its ticket.
    ///
    /// Nothing stops overlapping cycles here; only the newest ticket's
    /// result is ever applied.
    pub fn refresh(&mut self, fetcher: &dyn FetchDispatch) -> u64 {
        self.issued += 1;
        let ticket = self.issued;
        self.loading = true;
        self.error = None;
        self.last_refresh = Some(Instant::now());
        info!("refresh #{ticket} started");
        fetcher.dispatch(ticket);
        ticket
    }

    /// Refresh from the on-screen trigger, which is disabled while loading.
    pub fn trigger_refresh(&mut self, fetcher: &dyn FetchDispatch) -> bool {
        if self.loading {
            debug!("refresh trigger ignored while loading");
            return false;
        }
        self.refresh(fetcher);
        true
    }

    /// Applies a resolved fetch. Results from any ticket but the newest are
    /// dropped on purpose: the most recently started refresh wins, even if an
    /// older one resolves after it. Returns false for a dropped result.
    pub fn apply_result(&mut self, result: FetchResult) -> bool {
        if result.ticket != self.issued {
            debug!(
                "discarding stale fetch #{} (latest #{})",
                result.ticket, self.issued
            );
            return false;
        }
        match result.outcome {
            Ok(records) => {
                debug!("apply fetch #{} records={}", result.ticket, records.len());
                self.records = records;
                self.last_update = Some(SystemTime::now());
                self.clamp_scroll();
            }
            Err(err) => {
                debug!("apply fetch #{} error={err}", result.ticket);
                self.error = Some(err.user_message().to_string());
            }
        }
        self.loading = false;
        true
    }

    pub fn auto_refresh_due(&self, now: Instant) -> bool {
        if self.auto_refresh.is_zero() || self.loading {
            return false;
        }
        self.last_refresh
            .is_some_and(|at| now.saturating_duration_since(at) >= self.auto_refresh)
    }

    pub fn button_label(&self) -> &'static str {
        if self.loading {
            LOADING_LABEL
        } else {
            REFRESH_LABEL
        }
    }

    pub fn show_no_data(&self) -> bool {
        self.records.is_empty() && !self.loading
    }

    pub fn set_button_area(&mut self, area: Rect) {
        self.button_area = Some(area);
    }

    pub fn button_hit(&self, column: u16, row: u16) -> bool {
        self.button_area.is_some_and(|area| {
            column >= area.x
                && column < area.x.saturating_add(area.width)
                && row >= area.y
                && row < area.y.saturating_add(area.height)
        })
    }

    /// Records how many card rows exist and how many fit on screen.
    pub fn set_grid_extent(&mut self, rows: usize, visible_rows: usize) {
        self.grid_rows = rows;
        self.grid_visible_rows = visible_rows;
        self.clamp_scroll();
    }

    pub fn max_scroll(&self) -> usize {
        self.grid_rows.saturating_sub(self.grid_visible_rows.max(1))
    }

    pub fn scroll_down(&mut self, rows: usize) {
        self.scroll = self.scroll.saturating_add(rows).min(self.max_scroll());
    }

    pub fn scroll_up(&mut self, rows: usize) {
        self.scroll = self.scroll.saturating_sub(rows);
    }

    pub fn page_down(&mut self) {
        self.scroll_down(self.grid_visible_rows.max(1));
    }

    pub fn page_up(&mut self) {
        self.scroll_up(self.grid_visible_rows.max(1));
    }

    pub fn scroll_home(&mut self) {
        self.scroll = 0;
    }

    pub fn scroll_end(&mut self) {
        self.scroll = self.max_scroll();
    }

    fn clamp_scroll(&mut self) {
        self.scroll = self.scroll.min(self.max_scroll());
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{App, LOADING_LABEL, REFRESH_LABEL};
    use crate::model::AircraftRecord;
    use crate::net::{FetchDispatch, FetchFailure, FetchResult, FETCH_FAILED_MESSAGE};
    use ratatui::layout::Rect;
    use reqwest::StatusCode;
    use std::cell::RefCell;
    use std::time::{Duration, Instant};

    #[derive(Default)]
    pub(crate) struct RecordingDispatch {
        pub tickets: RefCell<Vec<u64>>,
    }

    impl FetchDispatch for RecordingDispatch {
        fn dispatch(&self, ticket: u64) {
            self.tickets.borrow_mut().push(ticket);
        }
    }

    fn record(icao24: &str) -> AircraftRecord {
        AircraftRecord {
            icao24: Some(icao24.to_string()),
            origin_country: Some("US".to_string()),
            ..AircraftRecord::default()
        }
    }

    fn ok(ticket: u64, ids: &[&str]) -> FetchResult {
        FetchResult {
            ticket,
            outcome: Ok(ids.iter().map(|id| record(id)).collect()),
        }
    }

    fn server_error(ticket: u64) -> FetchResult {
        FetchResult {
            ticket,
            outcome: Err(FetchFailure::Status(StatusCode::INTERNAL_SERVER_ERROR)),
        }
    }

    fn ids(app: &App) -> Vec<String> {
        app.records
            .iter()
            .filter_map(|r| r.icao24.clone())
            .collect()
    }

    #[test]
    fn starts_idle_and_empty() {
        let app = App::new("http://x/api/aircraft".to_string(), Duration::ZERO);
        assert!(app.records.is_empty());
        assert!(!app.loading);
        assert!(app.error.is_none());
        assert_eq!(app.button_label(), REFRESH_LABEL);
        assert!(app.show_no_data());
    }

    #[test]
    fn mount_fetches_exactly_once() {
        let fetcher = RecordingDispatch::default();
        let mut app = App::new(String::new(), Duration::ZERO);
        app.mount(&fetcher);
        app.mount(&fetcher);
        assert_eq!(*fetcher.tickets.borrow(), vec![1]);
        assert!(app.loading);
        assert_eq!(app.button_label(), LOADING_LABEL);
        assert!(!app.show_no_data());
    }

    #[test]
    fn success_replaces_records() {
        let fetcher = RecordingDispatch::default();
        let mut app = App::new(String::new(), Duration::ZERO);
        let ticket = app.refresh(&fetcher);
        assert!(app.apply_result(ok(ticket, &["a", "b"])));
        assert_eq!(ids(&app), vec!["a", "b"]);
        assert!(!app.loading);
        assert!(app.last_update.is_some());

        let ticket = app.refresh(&fetcher);
        app.apply_result(ok(ticket, &["c"]));
        assert_eq!(ids(&app), vec!["c"]);
    }

    #[test]
    fn failure_keeps_records_and_sets_message() {
        let fetcher = RecordingDispatch::default();
        let mut app = App::new(String::new(), Duration::ZERO);
        let ticket = app.refresh(&fetcher);
        app.apply_result(ok(ticket, &["kept"]));

        let ticket = app.refresh(&fetcher);
        assert!(app.error.is_none());
        app.apply_result(server_error(ticket));
        assert_eq!(app.error.as_deref(), Some(FETCH_FAILED_MESSAGE));
        assert_eq!(ids(&app), vec!["kept"]);
        assert!(!app.loading);

        // a new cycle clears the banner right away
        app.refresh(&fetcher);
        assert!(app.error.is_none());
    }

    #[test]
    fn repeated_refresh_is_idempotent() {
        let fetcher = RecordingDispatch::default();
        let mut app = App::new(String::new(), Duration::ZERO);
        let ticket = app.refresh(&fetcher);
        app.apply_result(ok(ticket, &["a", "b"]));
        let first = app.records.clone();
        let ticket = app.refresh(&fetcher);
        app.apply_result(ok(ticket, &["a", "b"]));
        assert_eq!(app.records, first);
    }

    #[test]
    fn newest_refresh_wins_when_responses_cross() {
        let fetcher = RecordingDispatch::default();
        let mut app = App::new(String::new(), Duration::ZERO);
        let first = app.refresh(&fetcher);
        let second = app.refresh(&fetcher);
        assert_eq!(*fetcher.tickets.borrow(), vec![first, second]);

        assert!(app.apply_result(ok(second, &["new"])));
        assert!(!app.loading);
        assert!(!app.apply_result(ok(first, &["old"])));
        assert_eq!(ids(&app), vec!["new"]);
        assert!(!app.loading);
    }

    #[test]
    fn stale_result_does_not_end_loading() {
        let fetcher = RecordingDispatch::default();
        let mut app = App::new(String::new(), Duration::ZERO);
        let first = app.refresh(&fetcher);
        let _second = app.refresh(&fetcher);
        assert!(!app.apply_result(server_error(first)));
        assert!(app.loading);
        assert!(app.error.is_none());
    }

    #[test]
    fn trigger_is_disabled_while_loading() {
        let fetcher = RecordingDispatch::default();
        let mut app = App::new(String::new(), Duration::ZERO);
        assert!(app.trigger_refresh(&fetcher));
        assert!(!app.trigger_refresh(&fetcher));
        assert_eq!(fetcher.tickets.borrow().len(), 1);
        // other call sites are not blocked
        app.refresh(&fetcher);
        assert_eq!(fetcher.tickets.borrow().len(), 2);
    }

    #[test]
    fn auto_refresh_timing() {
        let fetcher = RecordingDispatch::default();
        let mut off = App::new(String::new(), Duration::ZERO);
        off.mount(&fetcher);
        off.loading = false;
        assert!(!off.auto_refresh_due(Instant::now() + Duration::from_secs(3600)));

        let mut app = App::new(String::new(), Duration::from_secs(5));
        assert!(!app.auto_refresh_due(Instant::now()));
        let ticket = app.refresh(&fetcher);
        let later = Instant::now() + Duration::from_secs(6);
        assert!(!app.auto_refresh_due(later));
        app.apply_result(ok(ticket, &[]));
        assert!(!app.auto_refresh_due(Instant::now()));
        assert!(app.auto_refresh_due(later));
    }

    #[test]
    fn scroll_is_clamped_to_grid() {
        let mut app = App::new(String::new(), Duration::ZERO);
        app.set_grid_extent(10, 3);
        app.scroll_down(4);
        assert_eq!(app.scroll, 4);
        app.page_down();
        assert_eq!(app.scroll, 7);
        app.scroll_down(50);
        assert_eq!(app.scroll, 7);
        app.page_up();
        assert_eq!(app.scroll, 4);
        app.scroll_home();
        assert_eq!(app.scroll, 0);
        app.scroll_end();
        assert_eq!(app.scroll, 7);
        app.set_grid_extent(2, 3);
        assert_eq!(app.scroll, 0);
    }

    #[test]
    fn button_hit_testing() {
        let mut app = App::new(String::new(), Duration::ZERO);
        assert!(!app.button_hit(0, 0));
        app.set_button_area(Rect::new(2, 4, 16, 3));
        assert!(app.button_hit(2, 4));
        assert!(app.button_hit(17, 6));
        assert!(!app.button_hit(18, 6));
        assert!(!app.button_hit(5, 7));
    }
}
