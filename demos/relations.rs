/// Related-object embedding demo - orders with their positions
use mold::cast::{CastOptions, CompactionOptions, DocumentCaster, GroupingRules, RulesProfile, ValueRecord};
use serde_json::json;

fn main() -> anyhow::Result<()> {
    println!("=== Mold Relations ===\n");

    // Step 1: A record with a one-to-many relation. Arrays of objects are
    // picked up as related records; scalar arrays stay plain fields.
    let order = json!({
        "id": 501,
        "status": "paid",
        "tags": ["rush", "gift"],
        "order_positions": [
            {"id": 1, "quantity": 2, "price": 99},
            {"id": 2, "quantity": 1, "price": 79},
            {"id": 3, "quantity": 5, "price": 0}
        ]
    });

    println!("Original record:");
    println!("{}\n", serde_json::to_string_pretty(&order)?);

    let caster = DocumentCaster::new(RulesProfile::new(GroupingRules::default()).compile());

    // Step 2: Cast with the defaults - each position is embedded as its own
    // nested document, one level deep
    let record = ValueRecord::from_value("order", order.clone());
    let doc = caster.cast(&record);

    println!("With related-object embedding:");
    println!("{}\n", serde_json::to_string_pretty(&doc)?);
    println!("(position 3 lost its zero price to compaction - see --keep-empty)\n");

    // Step 3: Same record, compaction off
    let caster = caster.with_options(CastOptions {
        compaction: CompactionOptions::none(),
        ..Default::default()
    });
    let record = ValueRecord::from_value("order", order);
    let doc = caster.cast(&record);

    println!("Without compaction:");
    println!("{}", serde_json::to_string_pretty(&doc)?);

    Ok(())
}
