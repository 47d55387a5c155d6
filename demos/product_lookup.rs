//! Look up a product by registration number or GTIN.
//!
//! Usage: cargo run --example product_lookup -- <registration-number|gtin> [api-key]

use eprel::{Client, ProductLookup, SearchQuery};

#[tokio::main]
async fn main() -> Result<(), eprel::Error> {
    let mut args = std::env::args().skip(1);
    let id = args.next().unwrap_or_else(|| "12345".to_string());

    let mut builder = Client::builder().user_agent_suffix("product-lookup-demo");
    if let Some(key) = args.next().or_else(|| std::env::var("EPREL_API_KEY").ok()) {
        builder = builder.api_key(key);
    }
    let client = builder.build()?;

    if !client.ping().await {
        eprintln!("Registry is not reachable");
        return Ok(());
    }

    match client.product(&id, None).await {
        Ok(product) => {
            println!(
                "{} {} ({}) class {}",
                product.registration_number.as_deref().unwrap_or("?"),
                product.brand_name.as_deref().unwrap_or("?"),
                product.model_identifier.as_deref().unwrap_or("?"),
                product.energy_class.as_deref().unwrap_or("?"),
            );
            if let Some(params) = &product.technical_parameters {
                println!("{} technical parameters", params.len());
            }

            let label = client
                .labels(&id, None, &SearchQuery::new().with_filter("noRedirect", true))
                .await?;
            if let Some(address) = label.address() {
                println!("Label: {}", address);
            }
        }
        Err(e) if e.is_not_found() => {
            println!("No registration {}, trying it as a GTIN", id);
            match client.product_by_gtin(&id).await? {
                ProductLookup::Single(product) => {
                    println!("{:?}", product.registration_number)
                }
                ProductLookup::Many(products) => {
                    for product in products {
                        println!("{:?}", product.registration_number);
                    }
                }
            }
        }
        Err(e) => return Err(e),
    }

    Ok(())
}
