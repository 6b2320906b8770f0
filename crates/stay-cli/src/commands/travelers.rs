//! Travelers command: lists everyone with recorded legs.

use anyhow::Result;

use stay_db::Database;

pub fn run(db: &Database) -> Result<()> {
    let travelers = db.travelers()?;
    if travelers.is_empty() {
        println!("No travel legs recorded.");
        return Ok(());
    }
    for (traveler, count) in travelers {
        let noun = if count == 1 { "leg" } else { "legs" };
        println!("{traveler}  {count} {noun}");
    }
    Ok(())
}
