//! Integration tests for ledger construction, mining and tamper detection

use patientchain::blockchain::{validate_chain, Block, Ledger};
use patientchain::config::{Config, LedgerConfig};
use patientchain::{hash_block, proof_of_work, valid_proof, ChainError, FieldValue, ProofOfWork, Record};

/// Helper to build a ledger at a difficulty cheap enough for tests
fn easy_ledger() -> Result<Ledger, Box<dyn std::error::Error>> {
    let config = Config::from_toml_str("[ledger]\ndifficulty = 2\n")?;
    Ok(Ledger::with_config(&config.ledger)?)
}

/// Mines the next block the way an external caller would: proof, hash, create.
fn mine_next(ledger: &mut Ledger) -> Result<Block, Box<dyn std::error::Error>> {
    let last = ledger.get_last_block()?.clone();
    let proof = ledger.proof_of_work().search(last.proof);
    let previous_hash = hash_block(&last)?;
    Ok(ledger.create_block(proof, previous_hash))
}

#[test]
fn test_reference_usage_flow() -> Result<(), Box<dyn std::error::Error>> {
    let mut ledger = Ledger::new();
    ledger.add_patient_data("P001", "Surya", 30, "Fever")?;
    ledger.add_patient_data("P002", "Suresh", 40, "Common cold")?;

    let last = ledger.get_last_block()?.clone();
    let proof = proof_of_work(last.proof);
    assert_eq!(proof, 35293);
    let block = ledger.create_block(proof, hash_block(&last)?);

    assert_eq!(block.index, 2);
    assert_eq!(block.data.len(), 2);
    assert_eq!(block.data[0].get("name"), Some(&FieldValue::from("Surya")));
    assert!(valid_proof(last.proof, block.proof));
    assert!(ledger.is_chain_valid());
    Ok(())
}

#[test]
fn test_records_land_in_order_and_pending_clears() -> Result<(), Box<dyn std::error::Error>> {
    let mut ledger = easy_ledger()?;
    let r1 = Record::new().with("patient_id", "P010").with("allergies", false);
    let r2 = Record::new().with("patient_id", "P011").with("weight_kg", 71.5);

    assert_eq!(ledger.add_record(r1.clone())?, 2);
    assert_eq!(ledger.add_record(r2.clone())?, 2);
    let block = mine_next(&mut ledger)?;

    assert_eq!(block.data, vec![r1, r2]);
    assert!(ledger.pending().is_empty());
    assert_eq!(ledger.add_record(Record::new().with("n", 1))?, 3);
    Ok(())
}

#[test]
fn test_valid_chain_through_many_blocks() -> Result<(), Box<dyn std::error::Error>> {
    let mut ledger = easy_ledger()?;
    let mut previous_len = ledger.len();
    for i in 0..5 {
        ledger.add_patient_data(&format!("P{:03}", i), "Anon", 50, "Flu")?;
        mine_next(&mut ledger)?;
        assert!(ledger.len() > previous_len);
        previous_len = ledger.len();
    }
    // an empty block is fine too
    mine_next(&mut ledger)?;

    assert_eq!(ledger.len(), 7);
    let indices: Vec<u64> = ledger.blocks().iter().map(|b| b.index).collect();
    assert_eq!(indices, (1..=7).collect::<Vec<u64>>());
    assert!(ledger.is_chain_valid());
    Ok(())
}

#[test]
fn test_tampered_diagnosis_detected() -> Result<(), Box<dyn std::error::Error>> {
    let mut ledger = easy_ledger()?;
    ledger.add_patient_data("P001", "Surya", 30, "Fever")?;
    mine_next(&mut ledger)?;
    mine_next(&mut ledger)?;
    assert!(ledger.is_chain_valid());

    let mut blocks = ledger.blocks().to_vec();
    blocks[1].data[0].insert("diagnosis", "Healthy");

    let pow = *ledger.proof_of_work();
    assert_eq!(
        validate_chain(&blocks, &pow),
        Err(ChainError::InvalidBlockLinkage { index: 3 })
    );

    let tampered = Ledger::from_blocks(blocks, &LedgerConfig { difficulty: 2, ..LedgerConfig::default() })?;
    assert!(!tampered.is_chain_valid());
    Ok(())
}

#[test]
fn test_tampered_last_block_changes_its_hash() -> Result<(), Box<dyn std::error::Error>> {
    let mut ledger = easy_ledger()?;
    ledger.add_patient_data("P001", "Surya", 30, "Fever")?;
    let block = mine_next(&mut ledger)?;

    let mut forged = block.clone();
    forged.data[0].insert("age", 31);
    assert_ne!(hash_block(&forged)?, hash_block(&block)?);
    Ok(())
}

#[test]
fn test_hash_independent_of_field_insertion_order() -> Result<(), Box<dyn std::error::Error>> {
    let forward = Record::new()
        .with("patient_id", "P001")
        .with("name", "Surya")
        .with("age", 30)
        .with("diagnosis", "Fever");
    let reversed = Record::new()
        .with("diagnosis", "Fever")
        .with("age", 30)
        .with("name", "Surya")
        .with("patient_id", "P001");

    let a = Block {
        index: 2,
        timestamp: 1700000000.25,
        data: vec![forward],
        proof: 226,
        previous_hash: "abc".to_string(),
    };
    let b = Block {
        data: vec![reversed],
        ..a.clone()
    };

    assert_eq!(hash_block(&a)?, hash_block(&b)?);
    assert_eq!(hash_block(&a)?, hash_block(&a.clone())?);
    Ok(())
}

#[test]
fn test_non_finite_values_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let mut ledger = easy_ledger()?;
    let result = ledger.add_record(Record::new().with("temperature", f64::NAN));
    assert!(matches!(result, Err(ChainError::Serialization(_))));
    assert!(ledger.pending().is_empty());
    Ok(())
}

#[test]
fn test_smallest_proof_property() {
    let pow = ProofOfWork::new(2).unwrap();
    for previous in [0u64, 1, 100, 999, 35293] {
        let proof = pow.search(previous);
        assert!(pow.is_valid(previous, proof));
        assert!((0..proof).all(|p| !pow.is_valid(previous, p)));
    }
}

#[test]
fn test_independent_ledgers_do_not_share_state() -> Result<(), Box<dyn std::error::Error>> {
    let mut a = easy_ledger()?;
    let b = easy_ledger()?;
    a.add_patient_data("P001", "Surya", 30, "Fever")?;
    mine_next(&mut a)?;

    assert_eq!(a.len(), 2);
    assert_eq!(b.len(), 1);
    assert!(b.pending().is_empty());
    Ok(())
}

#[test]
fn test_blocks_round_trip_through_json() -> Result<(), Box<dyn std::error::Error>> {
    let mut ledger = easy_ledger()?;
    ledger.add_patient_data("P001", "Zoë", 30, "Fever")?;
    mine_next(&mut ledger)?;

    let json = serde_json::to_string(ledger.blocks())?;
    let blocks: Vec<Block> = serde_json::from_str(&json)?;
    let restored = Ledger::from_blocks(blocks, &LedgerConfig { difficulty: 2, ..LedgerConfig::default() })?;

    assert!(restored.is_chain_valid());
    assert_eq!(restored.blocks(), ledger.blocks());
    Ok(())
}
