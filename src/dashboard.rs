//! Dashboard controller: a state machine that turns user and network events
//! into state changes plus effects for the caller to run.
//!
//! Effects are not cancelled. If two delivery fetches overlap, whichever
//! completes last wins.

use crate::client::ClientError;
use crate::delivery::Delivery;
use crate::models::{AddDeliveryRequest, Carrier, FilterMode};
use crate::normalize::CarrierDirectory;
use crate::search::{SearchPatch, SearchState};
use crate::view::{build_detail, build_view, DashboardView, DeliveryDetail};

#[derive(Debug, Clone, PartialEq)]
pub enum DeliveriesState {
    Loading,
    Loaded(Vec<Delivery>),
    Failed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddDeliveryForm {
    pub tracking_number: String,
    pub carrier_code: String,
    pub title: String,
}

impl AddDeliveryForm {
    fn to_request(&self) -> AddDeliveryRequest {
        AddDeliveryRequest {
            tracking_number: Some(self.tracking_number.clone()),
            carrier_code: Some(self.carrier_code.clone()).filter(|code| !code.is_empty()),
            title: Some(self.title.clone()).filter(|title| !title.is_empty()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    SignIn,
    /// Replace the current URL's search parameters.
    Dashboard(SearchState),
}

impl Navigation {
    pub fn href(&self) -> String {
        match self {
            Navigation::SignIn => "/sign-in".to_string(),
            Navigation::Dashboard(search) => format!("/app?{}", search.to_query()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    Mounted,
    DeliveriesFetched(Result<Vec<Delivery>, ClientError>),
    CarriersFetched(Vec<Carrier>),
    PatchSearch(SearchPatch),
    ResetFilters,
    ToggleFilterPanel,
    SelectDelivery(Delivery),
    CloseDetail,
    OpenAddModal,
    CloseAddModal,
    SetTrackingNumber(String),
    SetCarrierCode(String),
    SetTitle(String),
    SubmitAdd,
    DeliveryAdded(Result<(), ClientError>),
    EscapePressed,
    SignOut,
    SessionEnded,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    FetchDeliveries(FilterMode),
    FetchCarriers,
    SubmitDelivery(AddDeliveryRequest),
    EndSession,
    Navigate(Navigation),
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    search: SearchState,
    deliveries: DeliveriesState,
    carriers: Vec<Carrier>,
    form: AddDeliveryForm,
    add_modal_open: bool,
    add_pending: bool,
    add_error: Option<String>,
    selected: Option<Delivery>,
    filter_panel_open: bool,
}

impl Dashboard {
    pub fn new(search: SearchState) -> Self {
        Self {
            search,
            deliveries: DeliveriesState::Loading,
            carriers: Vec::new(),
            form: AddDeliveryForm::default(),
            add_modal_open: false,
            add_pending: false,
            add_error: None,
            selected: None,
            filter_panel_open: false,
        }
    }

    pub fn update(&mut self, msg: Msg) -> Vec<Effect> {
        match msg {
            Msg::Mounted => {
                self.deliveries = DeliveriesState::Loading;
                vec![Effect::FetchDeliveries(self.search.mode), Effect::FetchCarriers]
            }
            Msg::DeliveriesFetched(Ok(deliveries)) => {
                self.refresh_selected(&deliveries);
                self.deliveries = DeliveriesState::Loaded(deliveries);
                Vec::new()
            }
            Msg::DeliveriesFetched(Err(ClientError::Unauthorized)) => {
                vec![Effect::Navigate(Navigation::SignIn)]
            }
            Msg::DeliveriesFetched(Err(ClientError::Failed(message))) => {
                self.deliveries = DeliveriesState::Failed(message);
                Vec::new()
            }
            Msg::CarriersFetched(carriers) => {
                self.carriers = carriers;
                Vec::new()
            }
            Msg::PatchSearch(patch) => self.patch_search(patch),
            Msg::ResetFilters => self.patch_search(SearchPatch::clear_all()),
            Msg::ToggleFilterPanel => {
                self.filter_panel_open = !self.filter_panel_open;
                Vec::new()
            }
            Msg::SelectDelivery(delivery) => {
                self.selected = Some(delivery);
                Vec::new()
            }
            Msg::CloseDetail => {
                self.selected = None;
                Vec::new()
            }
            Msg::OpenAddModal => {
                self.add_modal_open = true;
                Vec::new()
            }
            Msg::CloseAddModal => {
                self.add_modal_open = false;
                Vec::new()
            }
            Msg::SetTrackingNumber(value) => {
                self.form.tracking_number = value;
                Vec::new()
            }
            Msg::SetCarrierCode(value) => {
                self.form.carrier_code = value;
                Vec::new()
            }
            Msg::SetTitle(value) => {
                self.form.title = value;
                Vec::new()
            }
            Msg::SubmitAdd => {
                if self.add_pending {
                    return Vec::new();
                }
                self.add_pending = true;
                self.add_error = None;
                vec![Effect::SubmitDelivery(self.form.to_request())]
            }
            Msg::DeliveryAdded(result) => {
                self.add_pending = false;
                match result {
                    Ok(()) => {
                        self.form = AddDeliveryForm::default();
                        self.add_modal_open = false;
                        self.add_error = None;
                        vec![Effect::FetchDeliveries(self.search.mode)]
                    }
                    Err(ClientError::Unauthorized) => vec![Effect::Navigate(Navigation::SignIn)],
                    Err(ClientError::Failed(message)) => {
                        self.add_error = Some(message);
                        Vec::new()
                    }
                }
            }
            Msg::EscapePressed => {
                if self.selected.is_some() {
                    self.selected = None;
                } else if self.add_modal_open {
                    self.add_modal_open = false;
                } else if self.filter_panel_open {
                    self.filter_panel_open = false;
                }
                Vec::new()
            }
            Msg::SignOut => vec![Effect::EndSession],
            Msg::SessionEnded => vec![Effect::Navigate(Navigation::SignIn)],
        }
    }

    fn patch_search(&mut self, patch: SearchPatch) -> Vec<Effect> {
        let next = self.search.apply(patch);
        if next == self.search {
            return Vec::new();
        }

        let mode_changed = next.mode != self.search.mode;
        self.search = next;

        let mut effects = vec![Effect::Navigate(Navigation::Dashboard(self.search.clone()))];
        if mode_changed {
            self.deliveries = DeliveriesState::Loading;
            effects.push(Effect::FetchDeliveries(self.search.mode));
        }
        effects
    }

    fn refresh_selected(&mut self, deliveries: &[Delivery]) {
        let Some(tracking_number) = self
            .selected
            .as_ref()
            .and_then(|selected| selected.tracking_number.as_deref())
        else {
            return;
        };

        if let Some(refreshed) = deliveries
            .iter()
            .find(|delivery| delivery.tracking_number.as_deref() == Some(tracking_number))
        {
            self.selected = Some(refreshed.clone());
        }
    }

    pub fn search(&self) -> &SearchState {
        &self.search
    }

    pub fn deliveries(&self) -> &DeliveriesState {
        &self.deliveries
    }

    pub fn carriers(&self) -> &[Carrier] {
        &self.carriers
    }

    pub fn form(&self) -> &AddDeliveryForm {
        &self.form
    }

    pub fn selected(&self) -> Option<&Delivery> {
        self.selected.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.deliveries == DeliveriesState::Loading
    }

    pub fn is_adding(&self) -> bool {
        self.add_pending
    }

    pub fn is_add_modal_open(&self) -> bool {
        self.add_modal_open
    }

    pub fn is_filter_panel_open(&self) -> bool {
        self.filter_panel_open
    }

    /// List failure first, then add failure. Auth failures redirect instead.
    pub fn error(&self) -> Option<&str> {
        match &self.deliveries {
            DeliveriesState::Failed(message) => Some(message.as_str()),
            _ => self.add_error.as_deref(),
        }
    }

    pub fn view(&self) -> DashboardView {
        let deliveries: &[Delivery] = match &self.deliveries {
            DeliveriesState::Loaded(deliveries) => deliveries.as_slice(),
            _ => &[],
        };
        build_view(deliveries, &self.carriers, &self.search)
    }

    pub fn detail(&self) -> Option<DeliveryDetail> {
        let directory = CarrierDirectory::new(&self.carriers);
        self.selected
            .as_ref()
            .map(|delivery| build_detail(delivery, &directory))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GroupBy;

    fn parcel(tracking_number: &str, status: &str) -> Delivery {
        Delivery {
            tracking_number: Some(tracking_number.to_string()),
            status: Some(status.to_string()),
            ..Default::default()
        }
    }

    fn loaded(deliveries: Vec<Delivery>) -> Dashboard {
        let mut dashboard = Dashboard::new(SearchState::default());
        dashboard.update(Msg::Mounted);
        dashboard.update(Msg::DeliveriesFetched(Ok(deliveries)));
        dashboard
    }

    #[test]
    fn mount_fetches_deliveries_and_carriers() {
        let mut dashboard = Dashboard::new(SearchState::parse_query("mode=recent"));
        let effects = dashboard.update(Msg::Mounted);
        assert_eq!(
            effects,
            vec![Effect::FetchDeliveries(FilterMode::Recent), Effect::FetchCarriers]
        );
        assert!(dashboard.is_loading());
    }

    #[test]
    fn unauthorized_fetch_redirects_to_sign_in() {
        let mut dashboard = Dashboard::new(SearchState::default());
        dashboard.update(Msg::Mounted);
        let effects = dashboard.update(Msg::DeliveriesFetched(Err(ClientError::Unauthorized)));
        assert_eq!(effects, vec![Effect::Navigate(Navigation::SignIn)]);
        assert_eq!(dashboard.error(), None);
    }

    #[test]
    fn mode_change_refetches_other_patches_only_navigate() {
        let mut dashboard = loaded(vec![parcel("A", "in transit")]);

        let effects = dashboard.update(Msg::PatchSearch(SearchPatch::group(GroupBy::Carrier)));
        assert_eq!(effects.len(), 1);
        assert!(matches!(effects[0], Effect::Navigate(Navigation::Dashboard(_))));
        assert!(!dashboard.is_loading());

        let effects = dashboard.update(Msg::PatchSearch(SearchPatch::mode(FilterMode::Recent)));
        assert_eq!(effects.last(), Some(&Effect::FetchDeliveries(FilterMode::Recent)));
        assert!(dashboard.is_loading());

        let effects = dashboard.update(Msg::PatchSearch(SearchPatch::mode(FilterMode::Recent)));
        assert!(effects.is_empty());
    }

    #[test]
    fn late_response_overwrites_earlier_state() {
        let mut dashboard = loaded(Vec::new());
        dashboard.update(Msg::PatchSearch(SearchPatch::mode(FilterMode::Recent)));
        dashboard.update(Msg::DeliveriesFetched(Ok(vec![parcel("recent", "done")])));
        dashboard.update(Msg::DeliveriesFetched(Ok(vec![parcel("stale", "done")])));

        let view = dashboard.view();
        assert_eq!(view.deliveries[0].key, "stale");
    }

    #[test]
    fn escape_closes_one_layer_at_a_time() {
        let mut dashboard = loaded(vec![parcel("A", "x")]);
        dashboard.update(Msg::ToggleFilterPanel);
        dashboard.update(Msg::OpenAddModal);
        dashboard.update(Msg::SelectDelivery(parcel("A", "x")));

        dashboard.update(Msg::EscapePressed);
        assert!(dashboard.selected().is_none());
        assert!(dashboard.is_add_modal_open());
        assert!(dashboard.is_filter_panel_open());

        dashboard.update(Msg::EscapePressed);
        assert!(!dashboard.is_add_modal_open());
        assert!(dashboard.is_filter_panel_open());

        dashboard.update(Msg::EscapePressed);
        assert!(!dashboard.is_filter_panel_open());
    }

    #[test]
    fn successful_add_resets_form_and_refetches() {
        let mut dashboard = loaded(Vec::new());
        dashboard.update(Msg::OpenAddModal);
        dashboard.update(Msg::SetTrackingNumber("1Z999".to_string()));
        dashboard.update(Msg::SetTitle("Monitor".to_string()));

        let effects = dashboard.update(Msg::SubmitAdd);
        assert_eq!(
            effects,
            vec![Effect::SubmitDelivery(AddDeliveryRequest {
                tracking_number: Some("1Z999".to_string()),
                carrier_code: None,
                title: Some("Monitor".to_string()),
            })]
        );
        assert!(dashboard.is_adding());
        assert!(dashboard.update(Msg::SubmitAdd).is_empty());

        let effects = dashboard.update(Msg::DeliveryAdded(Ok(())));
        assert_eq!(effects, vec![Effect::FetchDeliveries(FilterMode::Active)]);
        assert_eq!(dashboard.form(), &AddDeliveryForm::default());
        assert!(!dashboard.is_add_modal_open());
        assert!(!dashboard.is_adding());
    }

    #[test]
    fn failed_add_keeps_modal_and_reports_error() {
        let mut dashboard = loaded(Vec::new());
        dashboard.update(Msg::OpenAddModal);
        dashboard.update(Msg::SetTrackingNumber("X".to_string()));
        dashboard.update(Msg::SubmitAdd);
        dashboard.update(Msg::DeliveryAdded(Err(ClientError::Failed("Too many requests".to_string()))));

        assert!(dashboard.is_add_modal_open());
        assert_eq!(dashboard.form().tracking_number, "X");
        assert_eq!(dashboard.error(), Some("Too many requests"));

        dashboard.update(Msg::SubmitAdd);
        let effects = dashboard.update(Msg::DeliveryAdded(Err(ClientError::Unauthorized)));
        assert_eq!(effects, vec![Effect::Navigate(Navigation::SignIn)]);
    }

    #[test]
    fn list_error_takes_priority_over_add_error() {
        let mut dashboard = loaded(Vec::new());
        dashboard.update(Msg::SubmitAdd);
        dashboard.update(Msg::DeliveryAdded(Err(ClientError::Failed("add failed".to_string()))));
        dashboard.update(Msg::DeliveriesFetched(Err(ClientError::Failed("list failed".to_string()))));
        assert_eq!(dashboard.error(), Some("list failed"));
    }

    #[test]
    fn refetch_refreshes_open_detail() {
        let mut dashboard = loaded(vec![parcel("A", "in transit")]);
        dashboard.update(Msg::SelectDelivery(parcel("A", "in transit")));
        dashboard.update(Msg::DeliveriesFetched(Ok(vec![parcel("A", "delivered")])));

        let detail = dashboard.detail().expect("detail open");
        assert_eq!(detail.status.label, "delivered");
    }

    #[test]
    fn sign_out_ends_session_then_redirects() {
        let mut dashboard = loaded(Vec::new());
        assert_eq!(dashboard.update(Msg::SignOut), vec![Effect::EndSession]);
        assert_eq!(
            dashboard.update(Msg::SessionEnded),
            vec![Effect::Navigate(Navigation::SignIn)]
        );
    }

    #[test]
    fn navigation_targets() {
        assert_eq!(Navigation::SignIn.href(), "/sign-in");
        let search = SearchState::parse_query("group=carrier&carrier=dhl");
        assert_eq!(
            Navigation::Dashboard(search).href(),
            "/app?mode=active&group=carrier&carrier=dhl"
        );
    }

    #[test]
    fn reset_filters_clears_group_and_filters() {
        let mut dashboard = Dashboard::new(SearchState::parse_query("group=status&carrier=ups&status=0"));
        let effects = dashboard.update(Msg::ResetFilters);
        assert_eq!(
            effects,
            vec![Effect::Navigate(Navigation::Dashboard(SearchState::default()))]
        );
        assert_eq!(dashboard.search().active_filter_count(), 0);
    }
}
