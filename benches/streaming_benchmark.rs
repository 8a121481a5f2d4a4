use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sheetstream::fast_writer::{
    CancellationToken, MemoryPackage, RowTypeInfo, Spreadsheet, SpreadsheetOptions,
};
use sheetstream::types::CellValue;
use sheetstream::ExcelWriter;
use tempfile::TempDir;
use tokio::runtime::{Builder, Runtime};

struct Record {
    id: i64,
    name: String,
    value: f64,
    active: bool,
}

fn runtime() -> Runtime {
    Builder::new_current_thread().build().unwrap()
}

fn records(size: usize) -> Vec<Record> {
    (0..size)
        .map(|i| Record {
            id: i as i64,
            name: format!("Name_{}", i),
            value: i as f64 * 1.25,
            active: i % 3 == 0,
        })
        .collect()
}

fn benchmark_memory_rows(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("memory_rows");

    for size in [1_000, 10_000, 100_000].iter() {
        let data = records(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| {
                rt.block_on(async {
                    let cancel = CancellationToken::new();
                    let mut spreadsheet =
                        Spreadsheet::create(MemoryPackage::new(), SpreadsheetOptions::default())
                            .unwrap();
                    spreadsheet.start_worksheet("Data", &cancel).await.unwrap();
                    for record in data {
                        spreadsheet
                            .add_row(
                                &[
                                    CellValue::Long(record.id),
                                    CellValue::from(record.name.as_str()),
                                    CellValue::Double(record.value),
                                    CellValue::Bool(record.active),
                                ],
                                &cancel,
                            )
                            .await
                            .unwrap();
                    }
                    black_box(spreadsheet.finish(&cancel).await.unwrap());
                })
            });
        });
    }

    group.finish();
}

fn benchmark_row_descriptor(c: &mut Criterion) {
    let rt = runtime();
    let info = RowTypeInfo::new(["Id", "Name", "Value", "Active"], |r: &Record, cells| {
        cells.push(r.id.into());
        cells.push(r.name.clone().into());
        cells.push(r.value.into());
        cells.push(r.active.into());
    });
    let data = records(10_000);

    c.bench_function("row_descriptor_10000", |b| {
        b.iter(|| {
            rt.block_on(async {
                let cancel = CancellationToken::new();
                let mut spreadsheet =
                    Spreadsheet::create(MemoryPackage::new(), SpreadsheetOptions::default())
                        .unwrap();
                spreadsheet.start_worksheet("Data", &cancel).await.unwrap();
                spreadsheet
                    .add_range_as_rows(&data, &info, &cancel)
                    .await
                    .unwrap();
                black_box(spreadsheet.finish(&cancel).await.unwrap());
            })
        });
    });
}

fn benchmark_file_write(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("file_write");
    group.sample_size(10);

    for size in [1_000, 10_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                rt.block_on(async {
                    let dir = TempDir::new().unwrap();
                    let mut writer = ExcelWriter::create(dir.path().join("bench.xlsx"))
                        .await
                        .unwrap();
                    writer.write_header_bold(["ID", "Name", "Value"]).await.unwrap();
                    for i in 0..size {
                        writer
                            .write_row_typed(&[
                                CellValue::Int(i),
                                CellValue::from(format!("Name_{}", i)),
                                CellValue::Double(f64::from(i) * 100.0),
                            ])
                            .await
                            .unwrap();
                    }
                    black_box(writer.save().await.unwrap());
                })
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_memory_rows,
    benchmark_row_descriptor,
    benchmark_file_write
);
criterion_main!(benches);
