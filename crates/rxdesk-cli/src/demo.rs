//! Seed catalog for `--simulate` runs.

use std::time::Duration;

use chrono::{Local, NaiveDate};
use rxdesk_core::models::{InventoryItem, Medicine};
use rxdesk_core::SimulatedInventory;

/// Delay applied to every simulated inventory call.
const DEMO_LATENCY_MS: u64 = 300;

struct Seed {
    name: &'static str,
    generic: &'static str,
    category: &'static str,
    dosage: &'static str,
    price: f64,
    quantity: i64,
    reorder_level: i64,
    expires_in_days: i64,
}

const SEEDS: &[Seed] = &[
    Seed {
        name: "Crocin Advance",
        generic: "Paracetamol",
        category: "Analgesic",
        dosage: "500mg",
        price: 30.0,
        quantity: 240,
        reorder_level: 50,
        expires_in_days: 400,
    },
    Seed {
        name: "Augmentin 625 Duo",
        generic: "Amoxicillin + Clavulanic Acid",
        category: "Antibiotic",
        dosage: "625mg",
        price: 223.5,
        quantity: 12,
        reorder_level: 20,
        expires_in_days: 180,
    },
    Seed {
        name: "Glycomet",
        generic: "Metformin",
        category: "Antidiabetic",
        dosage: "500mg",
        price: 22.0,
        quantity: 90,
        reorder_level: 40,
        expires_in_days: 21,
    },
    Seed {
        name: "Telma 40",
        generic: "Telmisartan",
        category: "Antihypertensive",
        dosage: "40mg",
        price: 115.0,
        quantity: 8,
        reorder_level: 25,
        expires_in_days: 300,
    },
    Seed {
        name: "Pan 40",
        generic: "Pantoprazole",
        category: "Antacid",
        dosage: "40mg",
        price: 155.0,
        quantity: 60,
        reorder_level: 30,
        expires_in_days: 9,
    },
    Seed {
        name: "Allegra 120",
        generic: "Fexofenadine",
        category: "Antihistamine",
        dosage: "120mg",
        price: 210.0,
        quantity: 45,
        reorder_level: 15,
        expires_in_days: 540,
    },
];

fn batch(index: usize, seed: &Seed, today: NaiveDate) -> InventoryItem {
    let id = index as i64 + 1;
    InventoryItem {
        id,
        medicine_id: id,
        medicine_name: Some(seed.name.to_string()),
        quantity: seed.quantity,
        reorder_level: seed.reorder_level,
        batch_number: Some(format!("B{:04}", 1000 + id)),
        expiry_date: Some((today + chrono::Duration::days(seed.expires_in_days)).to_string()),
        shelf_location: Some(format!("R{}-S{}", index / 3 + 1, index % 3 + 1)),
        supplier_id: None,
        created_at: None,
        updated_at: None,
    }
}

fn medicine(index: usize, seed: &Seed) -> Medicine {
    Medicine {
        id: index as i64 + 1,
        name: seed.name.to_string(),
        generic_name: Some(seed.generic.to_string()),
        category: seed.category.to_string(),
        manufacturer: None,
        dosage: Some(seed.dosage.to_string()),
        salt_composition: None,
        description: None,
        price: seed.price,
        unit: "strip".to_string(),
        created_at: None,
        updated_at: None,
    }
}

/// Simulated inventory preloaded with a small pharmacy catalog. Expiry dates
/// are relative to `today` so the expiring-soon views always have content.
pub fn seeded_inventory(today: NaiveDate) -> SimulatedInventory {
    let medicines = SEEDS.iter().enumerate().map(|(i, s)| medicine(i, s)).collect();
    let inventory = SEEDS
        .iter()
        .enumerate()
        .map(|(i, s)| batch(i, s, today))
        .collect();
    SimulatedInventory::new(medicines, inventory)
        .with_latency(Duration::from_millis(DEMO_LATENCY_MS))
}

pub fn demo_inventory() -> SimulatedInventory {
    seeded_inventory(Local::now().date_naive())
}
