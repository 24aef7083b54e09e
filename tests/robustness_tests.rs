use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn test_malformed_event_stream_handling() {
    let output_path = std::path::PathBuf::from("robustness_test.csv");
    let mut wtr = csv::Writer::from_path(&output_path).unwrap();
    wtr.write_record(&["op", "actor", "subject", "amount", "reference", "note"])
        .unwrap();

    wtr.write_record(&["user", "", "", "", "tg:seller", "alice"])
        .unwrap();
    wtr.write_record(&["user", "", "", "", "tg:buyer", "bob"])
        .unwrap();
    // Unknown op
    wtr.write_record(&["teleport", "1", "2", "", "", ""]).unwrap();
    wtr.write_record(&["gig", "1", "", "10.00", "logo design", "vector logo"])
        .unwrap();
    // Missing handle for a user registration (required)
    wtr.write_record(&["user", "", "", "", "", "stray"]).unwrap();
    // Seller buying their own gig
    wtr.write_record(&["buy", "1", "1", "", "", ""]).unwrap();
    // Valid purchase and funding
    wtr.write_record(&["buy", "2", "1", "", "", ""]).unwrap();
    wtr.write_record(&["fund", "", "1", "", "chain-tx-1", ""])
        .unwrap();
    wtr.flush().unwrap();
    drop(wtr);

    let mut cmd = Command::new(cargo_bin!("gig-escrow"));
    cmd.arg(&output_path);

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Error reading event"))
        .stderr(predicate::str::contains("Error processing event"))
        .stdout(predicate::str::contains(
            "1,1,2,1,FUNDS_HELD,10.00,USDT-TRON,0.80",
        ))
        .stdout(predicate::str::contains("2,0.00,USDT-TRON"));

    std::fs::remove_file(output_path).ok();
}

#[test]
fn test_invalid_data_types() {
    let output_path = std::path::PathBuf::from("data_type_test.csv");
    let mut wtr = csv::Writer::from_path(&output_path).unwrap();
    wtr.write_record(&["op", "actor", "subject", "amount", "reference", "note"])
        .unwrap();

    wtr.write_record(&["user", "", "", "", "tg:seller", "alice"])
        .unwrap();
    wtr.write_record(&["user", "", "", "", "tg:buyer", "bob"])
        .unwrap();
    // Text in the actor field
    wtr.write_record(&["gig", "one", "", "10.00", "logo design", "vector logo"])
        .unwrap();
    // Text in the amount field
    wtr.write_record(&["gig", "1", "", "ten", "logo design", "vector logo"])
        .unwrap();
    // Valid gig and purchase
    wtr.write_record(&["gig", "1", "", "10.00", "logo design", "vector logo"])
        .unwrap();
    wtr.write_record(&["buy", "2", "1", "", "", ""]).unwrap();
    wtr.flush().unwrap();
    drop(wtr);

    let mut cmd = Command::new(cargo_bin!("gig-escrow"));
    cmd.arg(&output_path);

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Error reading event"))
        .stdout(predicate::str::contains(
            "1,1,2,1,AWAIT_DEPOSIT,10.00,USDT-TRON,0.80",
        ));

    std::fs::remove_file(output_path).ok();
}
