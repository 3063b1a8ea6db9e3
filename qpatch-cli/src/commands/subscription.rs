use serde_json::Value;

use crate::error::AppError;
use crate::paths::PatchContext;
use crate::util;

pub const SUBSCRIPTION_URL: &str =
    "https://api2.qoder.sh/auth/full_stripe_profile";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 \
     Safari/537.36";

#[derive(Clone, Debug, clap::Args)]
#[clap(name = "subscription", about = "Query the subscription tied to the cached token")]
pub struct Subscription {}

impl Subscription {
    pub fn run(&self, ctx: &PatchContext) -> Result<(), AppError> {
        let token = util::lookup_value(&ctx.paths, util::ACCESS_TOKEN_KEY)
            .ok_or_else(|| {
                AppError::Subscription(
                    "no cached access token found".to_string(),
                )
            })?;

        let info = fetch_subscription(&token)?;
        println!(
            "Subscription: {}",
            info.kind.as_deref().unwrap_or("unknown")
        );
        if let Some(days) = info.days_remaining {
            println!("Days remaining on trial: {days}");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionInfo {
    pub kind: Option<String>,
    pub days_remaining: Option<i64>,
}

pub fn fetch_subscription(token: &str) -> Result<SubscriptionInfo, AppError> {
    let client = reqwest::blocking::Client::new();
    let response = client
        .get(SUBSCRIPTION_URL)
        .header("User-Agent", USER_AGENT)
        .header("Accept", "application/json")
        .header("Content-Type", "application/json")
        .header("Authorization", format!("Bearer {token}"))
        .send()?;

    if !response.status().is_success() {
        return Err(AppError::Subscription(format!(
            "server answered {}",
            response.status()
        )));
    }

    let body: Value = response.json()?;
    Ok(interpret(&body))
}

/// The endpoint has answered in two shapes over time: a flat
/// `membershipType`/`subscriptionStatus` pair, or a Stripe-style
/// nested `subscription.plan.nickname`. Handle both.
pub fn interpret(body: &Value) -> SubscriptionInfo {
    let days_remaining = body
        .get("daysRemainingOnTrial")
        .and_then(Value::as_i64);

    let kind = if let Some(membership) =
        body.get("membershipType").and_then(Value::as_str)
    {
        let status = body
            .get("subscriptionStatus")
            .and_then(Value::as_str)
            .unwrap_or("");
        match status {
            "active" if membership.is_empty() => None,
            "active" => Some(membership_display(membership)),
            "" => None,
            other => {
                Some(format!("{} ({other})", membership_display(membership)))
            }
        }
    } else if let Some(plan) = body
        .pointer("/subscription/plan/nickname")
        .and_then(Value::as_str)
    {
        let status = body
            .pointer("/subscription/status")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        if status == "active" {
            Some(plan_display(plan))
        } else {
            Some(format!("{plan} ({status})"))
        }
    } else {
        None
    };

    SubscriptionInfo {
        kind,
        days_remaining,
    }
}

fn membership_display(membership: &str) -> String {
    match membership {
        "pro" => "Pro".to_string(),
        "free_trial" => "Free Trial".to_string(),
        "pro_trial" => "Pro Trial".to_string(),
        "team" => "Team".to_string(),
        "enterprise" => "Enterprise".to_string(),
        other => capitalize(other),
    }
}

fn plan_display(plan: &str) -> String {
    let lower = plan.to_lowercase();
    if lower.contains("pro") && !lower.contains("trial") {
        "Pro".to_string()
    } else if lower.contains("pro_trial") {
        "Pro Trial".to_string()
    } else if lower.contains("free_trial") {
        "Free Trial".to_string()
    } else if lower.contains("team") {
        "Team".to_string()
    } else if lower.contains("enterprise") {
        "Enterprise".to_string()
    } else {
        plan.to_string()
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_interpret_flat_shape() {
        let info = interpret(&json!({
            "membershipType": "pro_trial",
            "subscriptionStatus": "active",
            "daysRemainingOnTrial": 11,
        }));
        assert_eq!(info.kind.as_deref(), Some("Pro Trial"));
        assert_eq!(info.days_remaining, Some(11));
    }

    #[test]
    fn test_interpret_inactive_status_is_annotated() {
        let info = interpret(&json!({
            "membershipType": "pro",
            "subscriptionStatus": "past_due",
        }));
        assert_eq!(info.kind.as_deref(), Some("Pro (past_due)"));
    }

    #[test]
    fn test_interpret_stripe_shape() {
        let info = interpret(&json!({
            "subscription": {
                "plan": {"nickname": "Qoder Pro Monthly"},
                "status": "active",
            }
        }));
        assert_eq!(info.kind.as_deref(), Some("Pro"));
        assert_eq!(info.days_remaining, None);
    }

    #[test]
    fn test_interpret_unknown_membership_is_capitalized() {
        let info = interpret(&json!({
            "membershipType": "student",
            "subscriptionStatus": "active",
        }));
        assert_eq!(info.kind.as_deref(), Some("Student"));
    }

    #[test]
    fn test_interpret_empty_body() {
        let info = interpret(&json!({}));
        assert_eq!(info.kind, None);
        assert_eq!(info.days_remaining, None);
    }
}
