mod common;

use anyhow::Result;
use common::{MarchExpenses, entry_ids, test_service};
use costbook::io::{Exporter, ImportOptions, Importer};

#[tokio::test]
async fn test_export_costs_csv() -> Result<()> {
    let (service, _temp) = test_service().await?;
    MarchExpenses::record_day(&service).await?;

    let mut buffer = Vec::new();
    let count = Exporter::new(&service)
        .export_csv("costs", Some(&["col_date", "col_group", "col_summ"][..]), &mut buffer)
        .await?;

    assert_eq!(count, 3);
    let csv = String::from_utf8(buffer)?;
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "col_date,col_group,col_summ");
    assert_eq!(lines[1], "15.03.2024,food,100");
    assert_eq!(lines[3], "15.03.2024,fuel,30");

    Ok(())
}

#[tokio::test]
async fn test_export_limits_json() -> Result<()> {
    let (service, _temp) = test_service().await?;
    service.insert_limit("март 2024", "food", 100.0).await?;

    let mut buffer = Vec::new();
    let count = Exporter::new(&service)
        .export_json("costs_limits", None, &mut buffer)
        .await?;

    assert_eq!(count, 1);
    let json: serde_json::Value = serde_json::from_slice(&buffer)?;
    assert_eq!(json[0]["col_date"], "01.03.2024");
    assert_eq!(json[0]["col_group"], "food");
    assert_eq!(json[0]["col_limit"], 100.0);

    Ok(())
}

#[tokio::test]
async fn test_export_unknown_collection() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let result = Exporter::new(&service)
        .export_csv("budgets", None, Vec::<u8>::new())
        .await;
    assert!(result.is_err());

    Ok(())
}

#[tokio::test]
async fn test_import_entries_csv() -> Result<()> {
    let (service, _temp) = test_service().await?;
    service.insert_limit("март 2024", "food", 100.0).await?;

    let csv = "date,category,amount\n15.03.2024,Food,70\n16.03.2024, food ,50.5\n17.03.2024,fuel,30\n";
    let result = Importer::new(&service)
        .import_entries_csv(csv.as_bytes(), ImportOptions::default())
        .await?;

    assert!(result.errors.is_empty());
    assert_eq!(result.imported, 3);
    assert_eq!(result.overages.len(), 1);
    assert_eq!(result.overages[0].spent, 120.5);
    assert_eq!(entry_ids(&service).await?.len(), 3);

    Ok(())
}

#[tokio::test]
async fn test_import_is_all_or_nothing() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let csv = "date,category,amount\n15.03.2024,food,70\n99.99.2024,food,50\n17.03.2024,!!!,30\n18.03.2024,fuel,abc\n";
    let result = Importer::new(&service)
        .import_entries_csv(csv.as_bytes(), ImportOptions::default())
        .await?;

    assert_eq!(result.imported, 0);
    assert_eq!(result.errors.len(), 3);
    assert_eq!(result.errors[0].line, 3);
    assert_eq!(result.errors[0].field.as_deref(), Some("date"));
    assert_eq!(result.errors[1].field.as_deref(), Some("category"));
    assert_eq!(result.errors[2].line, 5);
    assert!(entry_ids(&service).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_import_dry_run() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let csv = "date,category,amount\n15.03.2024,food,70\n";
    let options = ImportOptions {
        dry_run: true,
        ..Default::default()
    };
    let result = Importer::new(&service)
        .import_entries_csv(csv.as_bytes(), options)
        .await?;

    assert_eq!(result.imported, 1);
    assert!(entry_ids(&service).await?.is_empty());

    Ok(())
}
