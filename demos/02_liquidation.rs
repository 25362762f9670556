/// liquidation - a ratio cut pushes an account past the default threshold
use collateral_ledger::{
    AccountId, AccountStatus, AdminSet, Amount, AssetId, LedgerConfig, LendingEngine, MemoryCustody,
    SafeTimeProvider, TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let time = SafeTimeProvider::new(TimeSource::System);
    let admin = AccountId::new();
    let treasury = AccountId::new();
    let collector = AccountId::new();
    let alice = AccountId::new();
    let keeper = AccountId::new();

    let config = LedgerConfig::builder()
        .default_threshold_percent(120)
        .treasury(treasury)
        .build()?;

    let mut custody = MemoryCustody::new();
    custody.fund(alice, "WETH", Amount::new(20))?;
    custody.fund(alice, "GOV", Amount::new(10))?;
    custody.fund_pool("USD", Amount::new(1_000))?;

    let mut engine = LendingEngine::new(config, custody, AdminSet::new([admin]))?;
    let weth = AssetId::from("WETH");
    let gov = AssetId::from("GOV");
    engine.add_asset(admin, "WETH", collector, 5, 18, &time)?;
    engine.add_asset(admin, "GOV", AccountId::NULL, 1, 18, &time)?;

    engine.add_collateral(alice, &weth, Amount::new(20), &time)?;
    engine.add_collateral(alice, &gov, Amount::new(10), &time)?;
    engine.borrow(alice, Amount::new(100), &time)?;
    println!("status: {:?}", engine.account_status(&alice, &time)?);

    // WETH is revalued: collateral drops to 70, limit to 84
    engine.set_ratio(admin, &weth, 3, &time)?;
    let status = engine.account_status(&alice, &time)?;
    println!("status after revaluation: {:?}", status);

    if status == AccountStatus::Delinquent {
        let result = engine.liquidate_delinquent(keeper, alice, &time)?;
        println!("debt cleared: {}", result.debt_cleared);
        for seized in &result.seized {
            let destination = if seized.beneficiary.is_burn() {
                "burn".to_string()
            } else {
                seized.beneficiary.to_string()
            };
            println!("  {} {} -> {}", seized.amount, seized.asset, destination);
        }
    }

    println!("final status: {:?}", engine.account_status(&alice, &time)?);
    println!("collector holds {} WETH", engine.custody().wallet(&collector, &weth));

    Ok(())
}
