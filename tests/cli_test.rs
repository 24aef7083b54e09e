use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn test_cli_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin!());
    cmd.arg("tests/fixtures/marketplace.csv");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "order,gig,buyer,seller,status,amount,asset,fee",
        ))
        // The sale settles end to end
        .stdout(predicate::str::contains("1,1,2,1,COMPLETED,10.00,USDT-TRON,0.80"))
        // The buyer's wallet folds back to zero
        .stdout(predicate::str::contains("user,balance,currency"))
        .stdout(predicate::str::contains("2,0.00,USDT-TRON"));

    Ok(())
}
