use crate::commands::{prepare, CommandResult};
use productservice_db::fixtures::SeedProductInfo;
use productservice_db::{connect_with_config, migrations, CatalogSeedDataset};

pub fn run() -> CommandResult {
    let (config, runtime) = match prepare("seed") {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = connect_with_config(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let seed_result = CatalogSeedDataset::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

        let verification = CatalogSeedDataset::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        let run_result = if verification.all_present {
            Ok(seed_result.products_seeded)
        } else {
            let missing = verification
                .checks
                .iter()
                .filter_map(|(id, present)| (!present).then_some(*id))
                .collect::<Vec<_>>();
            Err(("seed_verification", verification_failure_message(&missing), 6u8))
        };

        pool.close().await;
        run_result
    });

    match result {
        Ok(products) => CommandResult::success("seed", success_message(&products)),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn success_message(products: &[SeedProductInfo]) -> String {
    let lines = products
        .iter()
        .map(|product| format!("  - {}: {}", product.id, product.name))
        .collect::<Vec<_>>();
    format!("demo catalog loaded with {} products:\n{}", products.len(), lines.join("\n"))
}

fn verification_failure_message(missing: &[&str]) -> String {
    if missing.is_empty() {
        "some seed rows failed to load".to_string()
    } else {
        format!("seed verification failed for products: {}", missing.join(", "))
    }
}
