/// audit log - every state change is recorded and exported as json
use collateral_ledger::{
    AccountId, AdminSet, Amount, AssetId, LedgerConfig, LendingEngine, LoanTerms, MemoryCustody,
    SafeTimeProvider, TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let time = SafeTimeProvider::new(TimeSource::System);
    let admin = AccountId::new();
    let treasury = AccountId::new();
    let alice = AccountId::new();

    // configuration can also be loaded from json
    let json = format!(
        r#"{{
            "reference_asset": "USD",
            "governance_asset": "GOV",
            "terms": {{
                "yearly_interest_percent": 3,
                "default_threshold_percent": 110,
                "treasury": "{}"
            }}
        }}"#,
        treasury
    );
    let config = LedgerConfig::from_json(&json)?;

    let mut custody = MemoryCustody::new();
    custody.fund(alice, "WBTC", Amount::new(3))?;
    custody.fund_pool("USD", Amount::new(1_000))?;

    let mut engine = LendingEngine::new(config, custody, AdminSet::new([admin]))?;
    let wbtc = AssetId::from("WBTC");

    engine.add_asset(admin, "WBTC", AccountId::NULL, 100, 18, &time)?;
    engine.set_loan_terms(admin, LoanTerms::new(4, 125, treasury)?, &time)?;
    engine.add_collateral(alice, &wbtc, Amount::new(3), &time)?;
    engine.borrow(alice, Amount::new(150), &time)?;
    engine.repay_loan(alice, &wbtc, Amount::new(1), &time)?;
    engine.withdraw_collateral(alice, &wbtc, Amount::new(1), &time)?;

    for record in engine.audit_log().records() {
        println!("#{} {} by {}", record.sequence, record.event.kind(), record.initiator);
    }

    println!("\n{}", engine.audit_log().to_json()?);

    Ok(())
}
