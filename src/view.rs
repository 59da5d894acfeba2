
use crate::delivery::Delivery;
use crate::models::{Carrier, FilterMode, GroupBy};
use crate::normalize::{
    current_location, delivery_key, delivery_status, event_location, expected_arrival, format_date,
    map_embed_url, resolve_carrier_code, resolve_carrier_name, resolve_delivery_title, CarrierDirectory,
    StatusMeta,
};
use crate::search::SearchState;
use crate::upstream::compare_names;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Decorated<'a> {
    pub index: usize,
    pub delivery: &'a Delivery,
    pub carrier_code: String,
    pub carrier_name: String,
    pub status: StatusMeta,
}

#[derive(Debug, Clone)]
pub struct DeliveryGroup<'a> {
    pub key: String,
    pub title: String,
    pub items: Vec<Decorated<'a>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusOption {
    pub value: String,
    pub label: String,
}

/// Newest expected arrival first. Dates compare as text; undated entries go last.
pub fn sort_by_expected_arrival(deliveries: &[Delivery]) -> Vec<&Delivery> {
    let mut sorted: Vec<&Delivery> = deliveries.iter().collect();
    sorted.sort_by(|a, b| {
        let a = expected_arrival(a).unwrap_or_default();
        let b = expected_arrival(b).unwrap_or_default();
        b.cmp(a)
    });
    sorted
}

pub fn decorate<'a>(sorted: &[&'a Delivery], directory: &CarrierDirectory) -> Vec<Decorated<'a>> {
    sorted
        .iter()
        .copied()
        .enumerate()
        .map(|(index, delivery)| Decorated {
            index,
            delivery,
            carrier_code: resolve_carrier_code(delivery),
            carrier_name: resolve_carrier_name(delivery, directory),
            status: delivery_status(delivery),
        })
        .collect()
}

pub fn carrier_options(carriers: &[Carrier], decorated: &[Decorated<'_>]) -> Vec<Carrier> {
    let mut names: HashMap<String, String> = carriers
        .iter()
        .map(|carrier| (carrier.code.trim().to_lowercase(), carrier.name.clone()))
        .collect();

    for item in decorated {
        if item.carrier_code.is_empty() {
            continue;
        }
        names
            .entry(item.carrier_code.clone())
            .or_insert_with(|| item.carrier_name.clone());
    }

    let mut options: Vec<Carrier> = names
        .into_iter()
        .map(|(code, name)| Carrier { code, name })
        .collect();
    options.sort_by(|a, b| compare_names(&a.name, &b.name).then_with(|| a.code.cmp(&b.code)));
    options
}

pub fn status_options(decorated: &[Decorated<'_>]) -> Vec<StatusOption> {
    let mut labels: HashMap<&str, &str> = HashMap::new();
    for item in decorated {
        labels.insert(&item.status.value, &item.status.label);
    }

    let mut options: Vec<StatusOption> = labels
        .into_iter()
        .map(|(value, label)| StatusOption {
            value: value.to_string(),
            label: label.to_string(),
        })
        .collect();
    options.sort_by(|a, b| compare_names(&a.label, &b.label).then_with(|| a.value.cmp(&b.value)));
    options
}

/// Exact match on normalized carrier code and status value; empty means any.
pub fn filter_deliveries<'a>(
    decorated: &[Decorated<'a>],
    carrier: Option<&str>,
    status: Option<&str>,
) -> Vec<Decorated<'a>> {
    let carrier = carrier.filter(|carrier| !carrier.is_empty());
    let status = status.filter(|status| !status.is_empty());

    decorated
        .iter()
        .filter(|item| carrier.is_none_or(|carrier| item.carrier_code == carrier))
        .filter(|item| status.is_none_or(|status| item.status.value == status))
        .cloned()
        .collect()
}

/// Buckets keep the incoming order of their items and are sorted by title.
pub fn group_deliveries<'a>(filtered: &[Decorated<'a>], group: GroupBy) -> Vec<DeliveryGroup<'a>> {
    if group == GroupBy::None {
        return Vec::new();
    }

    let mut groups: Vec<DeliveryGroup<'a>> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for item in filtered {
        let (key, title) = match group {
            GroupBy::Carrier if item.carrier_code.is_empty() => ("unknown".to_string(), item.carrier_name.clone()),
            GroupBy::Carrier => (item.carrier_code.clone(), item.carrier_name.clone()),
            _ => (item.status.value.clone(), item.status.label.clone()),
        };

        match positions.get(&key) {
            Some(&position) => groups[position].items.push(item.clone()),
            None => {
                positions.insert(key.clone(), groups.len());
                groups.push(DeliveryGroup {
                    key,
                    title,
                    items: vec![item.clone()],
                });
            }
        }
    }

    groups.sort_by(|a, b| compare_names(&a.title, &b.title));
    groups
}

#[derive(Debug, Clone, Serialize)]
pub struct DeliveryCard {
    pub key: String,
    pub title: String,
    pub tracking_number: Option<String>,
    pub carrier_code: String,
    pub carrier_name: String,
    pub status: StatusMeta,
    pub expected_arrival: String,
}

impl DeliveryCard {
    pub fn new(item: &Decorated<'_>) -> Self {
        Self {
            key: delivery_key(item.delivery, item.index),
            title: resolve_delivery_title(item.delivery),
            tracking_number: item.delivery.tracking_number.clone(),
            carrier_code: item.carrier_code.clone(),
            carrier_name: item.carrier_name.clone(),
            status: item.status.clone(),
            expected_arrival: format_date(expected_arrival(item.delivery)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupView {
    pub key: String,
    pub title: String,
    pub count: usize,
    pub deliveries: Vec<DeliveryCard>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub mode: FilterMode,
    pub group: GroupBy,
    pub carrier: Option<String>,
    pub status: Option<String>,
    pub active_filter_count: usize,
    pub total: usize,
    pub deliveries: Vec<DeliveryCard>,
    pub groups: Vec<GroupView>,
    pub carrier_options: Vec<Carrier>,
    pub status_options: Vec<StatusOption>,
}

pub fn build_view(deliveries: &[Delivery], carriers: &[Carrier], search: &SearchState) -> DashboardView {
    let directory = CarrierDirectory::new(carriers);
    let sorted = sort_by_expected_arrival(deliveries);
    let decorated = decorate(&sorted, &directory);
    let filtered = filter_deliveries(&decorated, search.carrier.as_deref(), search.status.as_deref());

    let groups = group_deliveries(&filtered, search.group)
        .into_iter()
        .map(|group| GroupView {
            count: group.items.len(),
            deliveries: group.items.iter().map(DeliveryCard::new).collect(),
            key: group.key,
            title: group.title,
        })
        .collect();

    DashboardView {
        mode: search.mode,
        group: search.group,
        carrier: search.carrier.clone(),
        status: search.status.clone(),
        active_filter_count: search.active_filter_count(),
        total: deliveries.len(),
        deliveries: filtered.iter().map(DeliveryCard::new).collect(),
        groups,
        carrier_options: carrier_options(carriers, &decorated),
        status_options: status_options(&decorated),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineEntry {
    pub description: String,
    pub date: String,
    pub location: Option<String>,
    pub details: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryDetail {
    pub title: String,
    pub tracking_number: Option<String>,
    pub status: StatusMeta,
    pub carrier_name: String,
    pub expected_arrival: String,
    pub current_location: Option<String>,
    pub map_url: Option<String>,
    pub timeline: Vec<TimelineEntry>,
}

pub fn build_detail(delivery: &Delivery, directory: &CarrierDirectory) -> DeliveryDetail {
    let location = current_location(delivery);
    DeliveryDetail {
        title: resolve_delivery_title(delivery),
        tracking_number: delivery.tracking_number.clone(),
        status: delivery_status(delivery),
        carrier_name: resolve_carrier_name(delivery, directory),
        expected_arrival: format_date(expected_arrival(delivery)),
        map_url: location.as_deref().map(map_embed_url),
        current_location: location,
        timeline: delivery
            .events
            .iter()
            .rev()
            .map(|event| TimelineEntry {
                description: event.event.clone().unwrap_or_else(|| "Update".to_string()),
                date: format_date(event.date.as_deref()),
                location: event_location(event),
                details: event.details.clone().filter(|details| !details.is_empty()),
            })
            .collect(),
    }
}
