use serde_json::Value;

use akania_store::ProfileSnapshot;

use crate::state::AppState;

fn join_strings(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        })
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "-".to_string())
}

pub async fn list_profiles(state: &AppState) -> anyhow::Result<bool> {
    let snapshot = ProfileSnapshot::load(&*state.store).await?;

    if snapshot.is_empty() {
        println!("No stored profiles in {}", state.store.dir().display());
        return Ok(true);
    }

    println!(
        "{} stored profiles in {} (loaded {})",
        snapshot.len(),
        state.store.dir().display(),
        snapshot.loaded_at().format("%Y-%m-%d %H:%M:%S UTC")
    );
    for profile in snapshot.profiles() {
        let name = profile
            .get("company_name")
            .and_then(Value::as_str)
            .unwrap_or("<unnamed>");
        println!(
            "  {name} | countries: {} | sector: {}",
            join_strings(profile.get("countries")),
            join_strings(profile.get("sector"))
        );
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_join_strings() {
        assert_eq!(join_strings(Some(&json!(["Kenya", "Uganda"]))), "Kenya, Uganda");
        assert_eq!(join_strings(Some(&json!([]))), "-");
        assert_eq!(join_strings(Some(&json!("Kenya"))), "-");
        assert_eq!(join_strings(None), "-");
    }
}
