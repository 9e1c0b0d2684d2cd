mod common;

use anyhow::Result;
use common::{MarchExpenses, date, test_service};
use costbook::application::LedgerError;

#[tokio::test]
async fn test_aggregate_by_date() -> Result<()> {
    let (service, _temp) = test_service().await?;
    MarchExpenses::record_day(&service).await?;
    service.record_expense("16.03.2024", "food", 999.0).await?;

    let totals = service.aggregate_by_date("15.03.2024").await?;
    let formatted: Vec<_> = totals.iter().map(|t| t.formatted()).collect();

    assert_eq!(
        formatted,
        vec![
            ("15.03.2024".to_string(), "food".to_string(), "150".to_string()),
            ("15.03.2024".to_string(), "fuel".to_string(), "30".to_string()),
        ]
    );
    assert_eq!(totals[0].date, date(2024, 3, 15));
    assert_eq!(totals[0].total, 150.0);

    Ok(())
}

#[tokio::test]
async fn test_aggregate_by_date_accepts_loose_format() -> Result<()> {
    let (service, _temp) = test_service().await?;
    MarchExpenses::record_day(&service).await?;

    let totals = service.aggregate_by_date("15/3/2024").await?;
    assert_eq!(totals.len(), 2);

    assert!(service.aggregate_by_date("14.03.2024").await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_aggregate_between_is_inclusive() -> Result<()> {
    let (service, _temp) = test_service().await?;
    MarchExpenses::record_month(&service).await?;

    let totals = service
        .aggregate_between("01.03.2024", "31.03.2024")
        .await?;
    let formatted: Vec<_> = totals.iter().map(|t| t.formatted()).collect();

    assert_eq!(
        formatted,
        vec![
            ("food".to_string(), "30.5".to_string()),
            ("fuel".to_string(), "30".to_string()),
            ("rent".to_string(), "1 500".to_string()),
        ]
    );

    Ok(())
}

#[tokio::test]
async fn test_aggregate_between_single_day_and_empty_range() -> Result<()> {
    let (service, _temp) = test_service().await?;
    MarchExpenses::record_month(&service).await?;

    let totals = service
        .aggregate_between("15.03.2024", "15.03.2024")
        .await?;
    assert_eq!(totals.len(), 1);
    assert_eq!(totals[0].category, "fuel");

    // Reversed bounds match nothing
    assert!(service
        .aggregate_between("31.03.2024", "01.03.2024")
        .await?
        .is_empty());

    Ok(())
}

#[tokio::test]
async fn test_aggregate_large_totals_are_grouped() -> Result<()> {
    let (service, _temp) = test_service().await?;
    service
        .insert_entries(
            [("01.03.2024", "rent", 45000.0), ("02.03.2024", "rent", 80000.0)],
            false,
        )
        .await?;

    let totals = service
        .aggregate_between("01.03.2024", "31.03.2024")
        .await?;
    assert_eq!(totals[0].formatted().1, "125 000");

    Ok(())
}

#[tokio::test]
async fn test_aggregate_invalid_dates() -> Result<()> {
    let (service, _temp) = test_service().await?;

    assert!(matches!(
        service.aggregate_by_date("tomorrow").await,
        Err(LedgerError::Invalid(_))
    ));
    assert!(matches!(
        service.aggregate_between("01.03.2024", "32.03.2024").await,
        Err(LedgerError::Invalid(_))
    ));

    Ok(())
}
