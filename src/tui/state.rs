use crate::model::DashboardView;
use crate::orchestrator::DashboardEvent;
use crate::taxonomy::{self, CategoryTaxonomy};
use time::OffsetDateTime;

pub const TAB_DASHBOARD: usize = 0;
pub const TAB_CATEGORIES: usize = 1;
pub const TAB_HELP: usize = 2;
pub const TAB_COUNT: usize = 3;

pub struct UiState {
    pub tab: usize,
    pub info: String,
    pub refreshing: bool,
    pub view: Option<DashboardView>,
    pub last_refreshed: Option<OffsetDateTime>,
    pub refresh_count: u64,
    pub taxonomy: CategoryTaxonomy,
    pub category_selected: usize, // Index into taxonomy.categories()
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            tab: TAB_DASHBOARD,
            info: String::new(),
            refreshing: false,
            view: None,
            last_refreshed: None,
            refresh_count: 0,
            taxonomy: taxonomy::taxonomy(),
            category_selected: 0,
        }
    }
}

impl UiState {
    pub fn apply_event(&mut self, ev: DashboardEvent) {
        match ev {
            DashboardEvent::Refreshing => {
                self.refreshing = true;
            }
            DashboardEvent::Refreshed { view, at } => {
                self.refreshing = false;
                self.refresh_count += 1;
                self.last_refreshed = Some(at);
                self.info = match view.error() {
                    Some(_) => "Dashboard degraded; showing error".into(),
                    None => String::new(),
                };
                self.view = Some(*view);
            }
        }
    }

    pub fn next_tab(&mut self) {
        self.tab = (self.tab + 1) % TAB_COUNT;
    }

    pub fn select_next_category(&mut self) {
        if self.category_selected + 1 < self.taxonomy.len() {
            self.category_selected += 1;
        }
    }

    pub fn select_prev_category(&mut self) {
        self.category_selected = self.category_selected.saturating_sub(1);
    }
}
