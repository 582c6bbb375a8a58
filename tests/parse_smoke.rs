use csvlex::{Format, HeaderMode, Reader, reader_from_path};
use std::{fs::File, io::Write, path::PathBuf, process::Command};

#[tokio::test]
async fn parses_gzip_and_counts_rows() -> anyhow::Result<()> {
    // Create small CSV
    let dir = tempfile::tempdir()?;
    let csv_path = dir.path().join("tiny.csv");
    let mut f = File::create(&csv_path)?;
    writeln!(f, "sku,col1")?;
    for i in 0..100_000 {
        writeln!(f, "SKU{i:06},{i}")?;
    }

    // gzip it (use system gzip for speed)
    let gz_path: PathBuf = dir.path().join("tiny.csv.gz");
    let status = Command::new("bash")
        .arg("-lc")
        .arg(format!(
            "gzip -c {} > {}",
            csv_path.display(),
            gz_path.display()
        ))
        .status()?;
    assert!(status.success());

    // Parse via library
    let (reader, meta) = reader_from_path(&gz_path).await?;
    assert_eq!(meta.compression, csvlex::Compression::Gzip);

    let format = Format::new().header(HeaderMode::FirstRecord);
    let mut rdr = Reader::new(reader, format)?;

    let names: Vec<String> = rdr.headers().await?.unwrap().names().to_vec();
    assert_eq!(names, vec!["sku".to_string(), "col1".to_string()]);

    let first = rdr.read_record().await?.unwrap();
    assert_eq!(first.get_named("sku")?, "SKU000000");
    assert!(first.is_consistent());

    while rdr.read_record().await?.is_some() {}
    assert_eq!(rdr.record_count(), 100_000);
    Ok(())
}

#[tokio::test]
async fn parses_uncompressed_file_from_path() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let csv_path = dir.path().join("plain.csv");
    let mut f = File::create(&csv_path)?;
    writeln!(f, "a,b")?;
    writeln!(f, "\"1,5\",2")?;

    let (reader, meta) = reader_from_path(&csv_path).await?;
    assert_eq!(meta.compression, csvlex::Compression::None);

    let mut rdr = Reader::new(reader, Format::default())?;
    let first = rdr.read_record().await?.unwrap();
    assert_eq!(first.get(0)?, "a");
    let second = rdr.read_record().await?.unwrap();
    assert_eq!(second.get(0)?, "1,5");
    assert!(second.field(0).unwrap().is_quoted());
    assert!(rdr.read_record().await?.is_none());
    Ok(())
}
