/// Quickstart demo - the simplest possible usage
use mold::cast::{DocumentCaster, GroupingRules, PostfixRule, PrefixRule, RulesProfile, ValueRecord};
use serde_json::json;
use std::collections::BTreeSet;

fn main() -> anyhow::Result<()> {
    println!("=== Mold Quick Start ===\n");

    // Step 1: Your flat record
    let my_record = json!({
        "id": 1,
        "first_name": "Ivo",
        "middle_name": null,
        "last_name": "Bobul",
        "nickname": "Super",
        "tel": "333-55-55",
        "email": "super.ivo@bobul.com",
        "website": null,
        "address_country": "Ukraine",
        "address_city": "Kiev",
        "address_street": "Tarasa Shevchenko",
        "address_state": null,
        "created_at": "2024-01-01T10:00:00Z"
    });

    println!("Original record:");
    println!("{}\n", serde_json::to_string_pretty(&my_record)?);

    // Step 2: Describe the grouping
    let rules = GroupingRules {
        skip: BTreeSet::from(["created_at".to_string()]),
        groups: [(
            "contacts".to_string(),
            BTreeSet::from(["tel".to_string(), "email".to_string(), "website".to_string()]),
        )]
        .into(),
        prefixes: vec![PrefixRule::new("address_")],
        postfixes: vec![PostfixRule::new("_name")],
    };

    // Step 3: Create a caster
    let caster = DocumentCaster::new(RulesProfile::new(rules).compile());

    // Step 4: Cast the record into a nested document
    let record = ValueRecord::from_value("person", my_record);
    let doc = caster.cast(&record);

    println!("Cast document:");
    println!("{}\n", serde_json::to_string_pretty(&doc)?);

    println!("✓ Done! Note how:");
    println!("  • address_* fields were grouped under `address`");
    println!("  • *_name fields were grouped under `name`");
    println!("  • tel/email landed under `contacts`");
    println!("  • created_at was skipped, null values were compacted away");

    Ok(())
}
