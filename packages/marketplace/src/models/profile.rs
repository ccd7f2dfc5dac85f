use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Round to two decimal places, the precision ratings are stored at.
fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Fold one rating into a running average.
///
/// With a zero count the average becomes the new rating exactly; no
/// division happens.
fn fold_rating(average: f64, count: u64, new_rating: f64) -> f64 {
    if count == 0 {
        new_rating
    } else {
        round2((average * count as f64 + new_rating) / (count + 1) as f64)
    }
}

/// Aggregate stats on a client profile. Recomputed through
/// [`ClientStats::apply`], never set directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientStats {
    pub projects_posted: u64,
    pub total_spent: f64,
    pub average_rating: f64,
    pub rating_count: u64,
}

/// Partial stats delta folded into a client profile.
#[derive(Debug, Clone, Default)]
pub struct ClientStatsDelta {
    pub projects_posted: u64,
    pub spent: f64,
    pub new_rating: Option<f64>,
}

impl ClientStats {
    pub fn apply(&mut self, delta: &ClientStatsDelta) {
        self.projects_posted += delta.projects_posted;
        self.total_spent = round2(self.total_spent + delta.spent);
        if let Some(rating) = delta.new_rating {
            self.average_rating = fold_rating(self.average_rating, self.rating_count, rating);
            self.rating_count += 1;
        }
    }
}

/// Aggregate stats on a freelancer profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreelancerStats {
    pub completed_projects: u64,
    pub total_earnings: f64,
    pub average_rating: f64,
    pub rating_count: u64,
}

/// Partial stats delta folded into a freelancer profile.
#[derive(Debug, Clone, Default)]
pub struct FreelancerStatsDelta {
    pub projects_completed: u64,
    pub earnings: f64,
    pub new_rating: Option<f64>,
}

impl FreelancerStats {
    pub fn apply(&mut self, delta: &FreelancerStatsDelta) {
        self.completed_projects += delta.projects_completed;
        self.total_earnings = round2(self.total_earnings + delta.earnings);
        if let Some(rating) = delta.new_rating {
            self.average_rating = fold_rating(self.average_rating, self.rating_count, rating);
            self.rating_count += 1;
        }
    }
}

/// A client's company profile, keyed by the owning principal's uid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientProfile {
    pub id: String,
    pub company_name: String,
    pub industry: String,
    pub company_size: Option<String>,
    pub website: Option<String>,
    pub location: String,
    pub description: String,
    #[serde(default)]
    pub stats: ClientStats,
    #[serde(with = "chrono::serde::ts_microseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_microseconds")]
    pub updated_at: DateTime<Utc>,
}

impl ClientProfile {
    /// The gate used by the profile-setup guard: all required fields set.
    pub fn is_complete(&self) -> bool {
        !self.company_name.trim().is_empty()
            && !self.industry.trim().is_empty()
            && !self.location.trim().is_empty()
            && !self.description.trim().is_empty()
    }

    /// Cosmetic fill percentage shown in the profile editor. Counts a
    /// superset of the required fields and gates nothing.
    pub fn completion_percent(&self) -> u8 {
        let fields: [bool; 6] = [
            !self.company_name.trim().is_empty(),
            !self.industry.trim().is_empty(),
            !self.location.trim().is_empty(),
            !self.description.trim().is_empty(),
            self.company_size.as_deref().is_some_and(|s| !s.trim().is_empty()),
            self.website.as_deref().is_some_and(|s| !s.trim().is_empty()),
        ];
        let filled = fields.iter().filter(|f| **f).count();
        ((filled * 100) / fields.len()) as u8
    }
}

/// A freelancer's public profile, keyed by the owning principal's uid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreelancerProfile {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub title: String,
    pub bio: String,
    pub location: String,
    pub hourly_rate: Option<f64>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub portfolio_links: Vec<String>,
    #[serde(default)]
    pub stats: FreelancerStats,
    #[serde(with = "chrono::serde::ts_microseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_microseconds")]
    pub updated_at: DateTime<Utc>,
}

impl FreelancerProfile {
    /// The gate used by the profile-setup guard: all required fields set
    /// and at least one skill listed.
    pub fn is_complete(&self) -> bool {
        !self.first_name.trim().is_empty()
            && !self.last_name.trim().is_empty()
            && !self.title.trim().is_empty()
            && !self.bio.trim().is_empty()
            && !self.location.trim().is_empty()
            && !self.skills.is_empty()
    }

    /// Cosmetic fill percentage. Counts a superset of the required fields
    /// and gates nothing.
    pub fn completion_percent(&self) -> u8 {
        let fields: [bool; 8] = [
            !self.first_name.trim().is_empty(),
            !self.last_name.trim().is_empty(),
            !self.title.trim().is_empty(),
            !self.bio.trim().is_empty(),
            !self.location.trim().is_empty(),
            !self.skills.is_empty(),
            self.hourly_rate.is_some(),
            !self.portfolio_links.is_empty(),
        ];
        let filled = fields.iter().filter(|f| **f).count();
        ((filled * 100) / fields.len()) as u8
    }
}

/// Fields collected by the client profile setup form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClientProfileInput {
    pub company_name: String,
    pub industry: String,
    #[serde(default)]
    pub company_size: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    pub location: String,
    pub description: String,
}

/// Fields collected by the freelancer profile setup form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFreelancerProfileInput {
    pub first_name: String,
    pub last_name: String,
    pub title: String,
    pub bio: String,
    pub location: String,
    #[serde(default)]
    pub hourly_rate: Option<f64>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub portfolio_links: Vec<String>,
}

/// Partial update to a client profile.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientProfilePatch {
    pub company_name: Option<String>,
    pub industry: Option<String>,
    pub company_size: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
}

/// Partial update to a freelancer profile.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreelancerProfilePatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub title: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub hourly_rate: Option<f64>,
    pub skills: Option<Vec<String>>,
    pub portfolio_links: Option<Vec<String>>,
}

pub fn validate_rating(rating: f64) -> Result<(), DomainError> {
    if !(1.0..=5.0).contains(&rating) {
        return Err(DomainError::Validation(
            "Rating must be between 1 and 5".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_rating_is_exact() {
        let mut stats = FreelancerStats::default();
        stats.apply(&FreelancerStatsDelta {
            new_rating: Some(4.5),
            ..Default::default()
        });
        assert_eq!(stats.average_rating, 4.5);
        assert_eq!(stats.rating_count, 1);
    }

    #[test]
    fn rating_fold_averages() {
        let mut stats = FreelancerStats::default();
        for rating in [5.0, 4.0, 3.0] {
            stats.apply(&FreelancerStatsDelta {
                new_rating: Some(rating),
                ..Default::default()
            });
        }
        assert_eq!(stats.rating_count, 3);
        assert_eq!(stats.average_rating, 4.0);
    }

    #[test]
    fn rating_fold_rounds_to_two_places() {
        let mut stats = ClientStats::default();
        for rating in [5.0, 4.0, 4.0] {
            stats.apply(&ClientStatsDelta {
                new_rating: Some(rating),
                ..Default::default()
            });
        }
        // (5 + 4 + 4) / 3 = 4.333... -> 4.33
        assert_eq!(stats.average_rating, 4.33);
    }

    #[test]
    fn counters_accumulate() {
        let mut stats = ClientStats::default();
        stats.apply(&ClientStatsDelta {
            projects_posted: 1,
            spent: 100.50,
            new_rating: None,
        });
        stats.apply(&ClientStatsDelta {
            projects_posted: 2,
            spent: 49.50,
            new_rating: None,
        });
        assert_eq!(stats.projects_posted, 3);
        assert_eq!(stats.total_spent, 150.0);
        assert_eq!(stats.rating_count, 0);
    }

    fn complete_freelancer() -> FreelancerProfile {
        let now = Utc::now();
        FreelancerProfile {
            id: "f1".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            title: "Engineer".into(),
            bio: "I build things".into(),
            location: "London".into(),
            hourly_rate: None,
            skills: vec!["rust".into()],
            portfolio_links: vec![],
            stats: FreelancerStats::default(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn freelancer_completeness_requires_skills() {
        let mut profile = complete_freelancer();
        assert!(profile.is_complete());
        profile.skills.clear();
        assert!(!profile.is_complete());
    }

    #[test]
    fn completion_percent_is_cosmetic_superset() {
        let profile = complete_freelancer();
        // Complete per the guard's gate, but optional fields are empty.
        assert!(profile.is_complete());
        assert!(profile.completion_percent() < 100);
    }
}
