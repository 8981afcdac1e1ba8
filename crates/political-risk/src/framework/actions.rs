use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use super::domain::CategoryId;
use super::scoring::round_to;

macro_rules! labelled_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => ($id:literal, $label:literal)),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $id)] $variant),+
        }

        impl $name {
            /// Wire identifier; also the sort key, so ordering is alphabetical by id.
            pub const fn as_id(self) -> &'static str {
                match self {
                    $(Self::$variant => $id),+
                }
            }

            pub const fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> std::cmp::Ordering {
                self.as_id().cmp(other.as_id())
            }
        }
    };
}

labelled_enum!(ActionType {
    ExecutiveOrder => ("executive-order", "Executive Order"),
    PresidentialMemo => ("presidential-memo", "Presidential Memo"),
    AgencyRule => ("agency-rule", "Agency Rule"),
    PolicyDirective => ("policy-directive", "Policy Directive"),
    Proclamation => ("proclamation", "Proclamation"),
    SigningStatement => ("signing-statement", "Signing Statement"),
});

labelled_enum!(ActionStatus {
    Implemented => ("implemented", "Implemented"),
    PartiallyImplemented => ("partially-implemented", "Partially Implemented"),
    Blocked => ("blocked", "Blocked"),
    Reversed => ("reversed", "Reversed"),
    PendingLitigation => ("pending-litigation", "Pending Litigation"),
    UnderReview => ("under-review", "Under Review"),
});

labelled_enum!(CaseStatus {
    Filed => ("filed", "Filed"),
    PreliminaryInjunction => ("preliminary-injunction", "Preliminary Injunction"),
    InjunctionGranted => ("injunction-granted", "Injunction Granted"),
    InjunctionDenied => ("injunction-denied", "Injunction Denied"),
    RulingAgainst => ("ruling-against", "Ruling Against"),
    RulingFor => ("ruling-for", "Ruling For"),
    Appealed => ("appealed", "Appealed"),
    Settled => ("settled", "Settled"),
    Dismissed => ("dismissed", "Dismissed"),
});

labelled_enum!(PushbackType {
    FederalLawsuit => ("federal-lawsuit", "Federal Lawsuit"),
    StateLawsuit => ("state-lawsuit", "State Lawsuit"),
    CongressionalAction => ("congressional-action", "Congressional Action"),
    StateLegislation => ("state-legislation", "State Legislation"),
    AgencyResistance => ("agency-resistance", "Agency Resistance"),
    JudicialRuling => ("judicial-ruling", "Judicial Ruling"),
    PublicProtest => ("public-protest", "Public Protest"),
});

labelled_enum!(
    /// Policy area of an executive action (distinct from risk categories).
    ActionCategory {
        Immigration => ("immigration", "Immigration"),
        Environment => ("environment", "Environment"),
        CivilRights => ("civil-rights", "Civil Rights"),
        GovernmentReform => ("government-reform", "Government Reform"),
        EconomicPolicy => ("economic-policy", "Economic Policy"),
        Judiciary => ("judiciary", "Judiciary"),
        Healthcare => ("healthcare", "Healthcare"),
        Education => ("education", "Education"),
        ForeignPolicy => ("foreign-policy", "Foreign Policy"),
        MediaPress => ("media-press", "Media & Press"),
    }
);

impl PushbackType {
    pub const fn is_legal_challenge(self) -> bool {
        matches!(
            self,
            Self::FederalLawsuit | Self::StateLawsuit | Self::JudicialRuling
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub action_type: ActionType,
    pub category: ActionCategory,
    pub status: ActionStatus,
    pub description: String,
    pub date_issued: NaiveDate,
    #[serde(default)]
    pub agencies: Vec<String>,
    #[serde(default)]
    pub pushback_ids: Vec<String>,
    #[serde(default)]
    pub related_risk_categories: Vec<CategoryId>,
    #[serde(default)]
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pushback {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub pushback_type: PushbackType,
    pub case_status: CaseStatus,
    pub description: String,
    pub date_filed: NaiveDate,
    #[serde(default)]
    pub court: Option<String>,
    #[serde(default)]
    pub plaintiffs: Vec<String>,
    #[serde(default)]
    pub action_ids: Vec<String>,
    #[serde(default)]
    pub outcome: Option<String>,
    #[serde(default)]
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionSortKey {
    #[default]
    Date,
    Status,
    Category,
    Type,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushbackSortKey {
    #[default]
    Date,
    Status,
    Type,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionCategorySummary {
    pub category: ActionCategory,
    pub total_actions: usize,
    pub blocked: usize,
    pub implemented: usize,
    pub pending_litigation: usize,
    pub legal_challenges: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerSummary {
    pub total_actions: usize,
    pub total_legal_challenges: usize,
    pub blocked_or_reversed: usize,
    /// Percentage of actions fully or partially implemented, 1 decimal.
    pub implementation_rate: f64,
    pub category_summaries: Vec<ActionCategorySummary>,
}

/// One pushback record with the actions it challenges.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseDetail {
    pub pushback: Pushback,
    pub related_actions: Vec<Action>,
}

/// Executive actions and the legal/political pushback against them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionsTracker {
    #[serde(default)]
    pub last_updated: Option<NaiveDate>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub pushback: Vec<Pushback>,
}

impl ActionsTracker {
    /// Case-insensitive match over text fields and labels; a blank query keeps everything.
    pub fn search(&self, query: &str) -> Self {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.clone();
        }
        let hit = |text: &str| text.to_lowercase().contains(&needle);

        let actions = self
            .actions
            .iter()
            .filter(|action| {
                hit(&action.title)
                    || hit(&action.description)
                    || action.agencies.iter().any(|agency| hit(agency))
                    || hit(action.category.label())
                    || hit(action.action_type.label())
            })
            .cloned()
            .collect();

        let pushback = self
            .pushback
            .iter()
            .filter(|item| {
                hit(&item.title)
                    || hit(&item.description)
                    || item.plaintiffs.iter().any(|plaintiff| hit(plaintiff))
                    || item.court.as_deref().is_some_and(hit)
                    || hit(item.pushback_type.label())
            })
            .cloned()
            .collect();

        Self {
            last_updated: self.last_updated,
            actions,
            pushback,
        }
    }

    /// Keep actions in `categories` and the pushback linked to them; empty keeps everything.
    pub fn filter_by_category(&self, categories: &[ActionCategory]) -> Self {
        if categories.is_empty() {
            return self.clone();
        }

        let actions: Vec<Action> = self
            .actions
            .iter()
            .filter(|action| categories.contains(&action.category))
            .cloned()
            .collect();
        let kept: HashSet<&str> = actions.iter().map(|action| action.id.as_str()).collect();
        let pushback = self
            .pushback
            .iter()
            .filter(|item| item.action_ids.iter().any(|id| kept.contains(id.as_str())))
            .cloned()
            .collect();

        Self {
            last_updated: self.last_updated,
            actions,
            pushback,
        }
    }

    pub fn sort_actions(&mut self, key: ActionSortKey, direction: SortDirection) {
        match key {
            ActionSortKey::Date => self.actions.sort_by_key(|action| action.date_issued),
            ActionSortKey::Status => self.actions.sort_by_key(|action| action.status),
            ActionSortKey::Category => self.actions.sort_by_key(|action| action.category),
            ActionSortKey::Type => self.actions.sort_by_key(|action| action.action_type),
        }
        if direction == SortDirection::Desc {
            self.actions.reverse();
        }
    }

    pub fn sort_pushback(&mut self, key: PushbackSortKey, direction: SortDirection) {
        match key {
            PushbackSortKey::Date => self.pushback.sort_by_key(|item| item.date_filed),
            PushbackSortKey::Status => self.pushback.sort_by_key(|item| item.case_status),
            PushbackSortKey::Type => self.pushback.sort_by_key(|item| item.pushback_type),
        }
        if direction == SortDirection::Desc {
            self.pushback.reverse();
        }
    }

    pub fn summary(&self) -> TrackerSummary {
        let total_actions = self.actions.len();
        let implemented = self
            .actions
            .iter()
            .filter(|action| {
                matches!(
                    action.status,
                    ActionStatus::Implemented | ActionStatus::PartiallyImplemented
                )
            })
            .count();
        let blocked_or_reversed = self
            .actions
            .iter()
            .filter(|action| {
                matches!(action.status, ActionStatus::Blocked | ActionStatus::Reversed)
            })
            .count();
        let implementation_rate = if total_actions == 0 {
            0.0
        } else {
            round_to(implemented as f64 / total_actions as f64 * 100.0, 1)
        };

        let mut categories: Vec<ActionCategory> =
            self.actions.iter().map(|action| action.category).collect();
        categories.sort();
        categories.dedup();

        let category_summaries = categories
            .into_iter()
            .map(|category| self.category_summary(category))
            .collect();

        TrackerSummary {
            total_actions,
            total_legal_challenges: self
                .pushback
                .iter()
                .filter(|item| item.pushback_type.is_legal_challenge())
                .count(),
            blocked_or_reversed,
            implementation_rate,
            category_summaries,
        }
    }

    pub fn case_detail(&self, pushback_id: &str) -> Option<CaseDetail> {
        let pushback = self.pushback.iter().find(|item| item.id == pushback_id)?;
        let related_actions = self
            .actions
            .iter()
            .filter(|action| pushback.action_ids.contains(&action.id))
            .cloned()
            .collect();

        Some(CaseDetail {
            pushback: pushback.clone(),
            related_actions,
        })
    }

    pub fn status_counts(&self) -> BTreeMap<ActionStatus, usize> {
        let mut counts = BTreeMap::new();
        for action in &self.actions {
            *counts.entry(action.status).or_insert(0) += 1;
        }
        counts
    }

    fn category_summary(&self, category: ActionCategory) -> ActionCategorySummary {
        let members: Vec<&Action> = self
            .actions
            .iter()
            .filter(|action| action.category == category)
            .collect();
        let ids: HashSet<&str> = members.iter().map(|action| action.id.as_str()).collect();
        let count = |status: ActionStatus| {
            members
                .iter()
                .filter(|action| action.status == status)
                .count()
        };

        ActionCategorySummary {
            category,
            total_actions: members.len(),
            blocked: count(ActionStatus::Blocked),
            implemented: count(ActionStatus::Implemented),
            pending_litigation: count(ActionStatus::PendingLitigation),
            legal_challenges: self
                .pushback
                .iter()
                .filter(|item| item.pushback_type.is_legal_challenge())
                .filter(|item| item.action_ids.iter().any(|id| ids.contains(id.as_str())))
                .count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, day).expect("valid date")
    }

    fn action(id: &str, category: ActionCategory, status: ActionStatus, day: u32) -> Action {
        Action {
            id: id.to_string(),
            title: format!("Order {id}"),
            action_type: ActionType::ExecutiveOrder,
            category,
            status,
            description: "Directs agencies".to_string(),
            date_issued: date(day),
            agencies: vec!["Department of Justice".to_string()],
            pushback_ids: Vec::new(),
            related_risk_categories: vec![CategoryId::RuleOfLaw],
            sources: Vec::new(),
        }
    }

    fn tracker() -> ActionsTracker {
        ActionsTracker {
            last_updated: Some(date(28)),
            actions: vec![
                action("a1", ActionCategory::Immigration, ActionStatus::Blocked, 3),
                action("a2", ActionCategory::Environment, ActionStatus::Implemented, 10),
                action("a3", ActionCategory::Immigration, ActionStatus::PendingLitigation, 7),
            ],
            pushback: vec![Pushback {
                id: "p1".to_string(),
                title: "States v. Order".to_string(),
                pushback_type: PushbackType::StateLawsuit,
                case_status: CaseStatus::InjunctionGranted,
                description: "Challenge to the order".to_string(),
                date_filed: date(5),
                court: Some("D. Mass.".to_string()),
                plaintiffs: vec!["Commonwealth of Massachusetts".to_string()],
                action_ids: vec!["a1".to_string()],
                outcome: None,
                sources: Vec::new(),
            }],
        }
    }

    #[test]
    fn search_matches_fields_and_labels() {
        let tracker = tracker();
        assert_eq!(tracker.search("  ").actions.len(), 3);
        assert_eq!(tracker.search("justice").actions.len(), 3);
        assert_eq!(tracker.search("environment").actions.len(), 1);

        let by_court = tracker.search("d. mass");
        assert!(by_court.actions.is_empty());
        assert_eq!(by_court.pushback.len(), 1);
    }

    #[test]
    fn category_filter_keeps_linked_pushback() {
        let tracker = tracker();
        let immigration = tracker.filter_by_category(&[ActionCategory::Immigration]);
        assert_eq!(immigration.actions.len(), 2);
        assert_eq!(immigration.pushback.len(), 1);

        let environment = tracker.filter_by_category(&[ActionCategory::Environment]);
        assert!(environment.pushback.is_empty());
        assert_eq!(tracker.filter_by_category(&[]).actions.len(), 3);
    }

    #[test]
    fn sorting_defaults_to_newest_first() {
        let mut tracker = tracker();
        tracker.sort_actions(ActionSortKey::Date, SortDirection::Desc);
        let ids: Vec<&str> = tracker.actions.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a2", "a3", "a1"]);

        tracker.sort_actions(ActionSortKey::Date, SortDirection::Asc);
        assert_eq!(tracker.actions[0].id, "a1");
    }

    #[test]
    fn sorting_by_status_category_and_type_follows_ids() {
        let mut first = action("a", ActionCategory::Immigration, ActionStatus::Implemented, 1);
        first.action_type = ActionType::ExecutiveOrder;
        let mut second = action("b", ActionCategory::CivilRights, ActionStatus::Blocked, 2);
        second.action_type = ActionType::AgencyRule;
        let mut tracker = ActionsTracker {
            last_updated: None,
            actions: vec![first, second],
            pushback: Vec::new(),
        };
        let ids = |tracker: &ActionsTracker| -> Vec<String> {
            tracker.actions.iter().map(|a| a.id.clone()).collect()
        };

        for key in [ActionSortKey::Status, ActionSortKey::Category, ActionSortKey::Type] {
            tracker.sort_actions(key, SortDirection::Asc);
            assert_eq!(ids(&tracker), vec!["b", "a"], "{key:?} ascending");
            tracker.sort_actions(key, SortDirection::Desc);
            assert_eq!(ids(&tracker), vec!["a", "b"], "{key:?} descending");
        }
    }

    #[test]
    fn pushback_sorts_by_case_status_id() {
        let mut tracker = tracker();
        let mut appealed = tracker.pushback[0].clone();
        appealed.id = "p2".to_string();
        appealed.case_status = CaseStatus::Appealed;
        tracker.pushback.push(appealed);

        tracker.sort_pushback(PushbackSortKey::Status, SortDirection::Asc);
        assert_eq!(tracker.pushback[0].id, "p2");
        assert!(ActionStatus::Blocked < ActionStatus::Implemented);
        assert_eq!(ActionStatus::PendingLitigation.as_id(), "pending-litigation");
    }

    #[test]
    fn case_detail_links_challenged_actions() {
        let tracker = tracker();
        let detail = tracker.case_detail("p1").expect("known case");
        assert_eq!(detail.pushback.title, "States v. Order");
        assert_eq!(detail.related_actions.len(), 1);
        assert_eq!(detail.related_actions[0].id, "a1");
        assert!(tracker.case_detail("missing").is_none());
    }

    #[test]
    fn status_counts_group_by_status() {
        let counts = tracker().status_counts();
        assert_eq!(counts.get(&ActionStatus::Blocked), Some(&1));
        assert_eq!(counts.get(&ActionStatus::Implemented), Some(&1));
        assert_eq!(counts.get(&ActionStatus::Reversed), None);
    }

    #[test]
    fn summary_serializes_with_camel_case_keys() {
        let value = serde_json::to_value(tracker().summary()).expect("serializes");
        assert_eq!(value["totalActions"], 3);
        assert_eq!(value["blockedOrReversed"], 1);
        assert_eq!(value["categorySummaries"][0]["legalChallenges"], 0);
        assert!(value.get("total_actions").is_none());
    }

    #[test]
    fn summary_counts_statuses_and_challenges() {
        let summary = tracker().summary();
        assert_eq!(summary.total_actions, 3);
        assert_eq!(summary.total_legal_challenges, 1);
        assert_eq!(summary.blocked_or_reversed, 1);
        assert_eq!(summary.implementation_rate, 33.3);

        let immigration = summary
            .category_summaries
            .iter()
            .find(|entry| entry.category == ActionCategory::Immigration)
            .expect("immigration summary");
        assert_eq!(immigration.total_actions, 2);
        assert_eq!(immigration.legal_challenges, 1);
        assert_eq!(immigration.pending_litigation, 1);
    }

    #[test]
    fn deserializes_dashboard_records() {
        let action: Action = serde_json::from_str(
            r#"{"id":"eo-1","title":"Order","type":"executive-order","category":"media-press",
                "status":"partially-implemented","description":"d","dateIssued":"2025-01-20",
                "relatedRiskCategories":["media-freedom"]}"#,
        )
        .expect("action parses");
        assert_eq!(action.category.label(), "Media & Press");
        assert_eq!(action.status, ActionStatus::PartiallyImplemented);
        assert_eq!(action.related_risk_categories, vec![CategoryId::MediaFreedom]);
    }
}
