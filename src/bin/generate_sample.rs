use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }

    /// True with probability `p`.
    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

/// One generated producer row. `None` marks a blank cell.
struct Producer {
    name: String,
    technician: Option<String>,
    district: String,
    buyer: Option<String>,
    coordinates: Option<String>,
    area_ha: Option<f64>,
    output_kg: i64,
}

const DISTRICTS: &[(&str, f64, f64)] = &[
    ("Centro", -5.1971, -39.2886),
    ("Norte", -5.0950, -39.2500),
    ("Sul", -5.3100, -39.3300),
    ("Leste", -5.2000, -39.1500),
];
const TECHNICIANS: &[&str] = &["Ana", "Bia", "Caio", "Davi"];
const BUYERS: &[&str] = &["Cooperativa", "Mercado Local", "PAA", "PNAE"];
const PREFIXES: &[&str] = &["Sítio", "Fazenda", "Chácara", "Lote"];
const SUFFIXES: &[&str] = &["Boa Vista", "Lagoa", "São José", "Santa Rita", "Novo", "Esperança"];

fn generate(count: usize, rng: &mut SimpleRng) -> Vec<Producer> {
    (0..count)
        .map(|i| {
            let (district, lat, lon) = DISTRICTS[i % DISTRICTS.len()];
            let name = format!("{} {} {}", rng.pick(PREFIXES), rng.pick(SUFFIXES), i + 1);
            let technician = (!rng.chance(0.05)).then(|| rng.pick(TECHNICIANS).to_string());
            let buyer = (!rng.chance(0.10)).then(|| rng.pick(BUYERS).to_string());
            let coordinates = if rng.chance(0.08) {
                Some("sem registro".to_string())
            } else {
                let dlat = (rng.next_f64() - 0.5) * 0.08;
                let dlon = (rng.next_f64() - 0.5) * 0.08;
                Some(format!("{:.5},{:.5}", lat + dlat, lon + dlon))
            };
            let area_ha = (!rng.chance(0.05)).then(|| (rng.next_f64() * 20.0 * 10.0).round() / 10.0);
            let output_kg = (rng.next_f64() * 5000.0) as i64 + 100;
            Producer {
                name,
                technician,
                district: district.to_string(),
                buyer,
                coordinates,
                area_ha,
                output_kg,
            }
        })
        .collect()
}

const HEADERS: [&str; 7] = [
    "PRODUTOR",
    "TECNICO",
    "DISTRITO",
    "COMPRADOR",
    "COORDENADAS",
    "AREA_HA",
    "PRODUCAO_KG",
];

fn write_parquet(rows: &[Producer], path: &str) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new(HEADERS[0], DataType::Utf8, false),
        Field::new(HEADERS[1], DataType::Utf8, true),
        Field::new(HEADERS[2], DataType::Utf8, false),
        Field::new(HEADERS[3], DataType::Utf8, true),
        Field::new(HEADERS[4], DataType::Utf8, true),
        Field::new(HEADERS[5], DataType::Float64, true),
        Field::new(HEADERS[6], DataType::Int64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.name.as_str()))),
            Arc::new(StringArray::from_iter(rows.iter().map(|r| r.technician.as_deref()))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.district.as_str()))),
            Arc::new(StringArray::from_iter(rows.iter().map(|r| r.buyer.as_deref()))),
            Arc::new(StringArray::from_iter(rows.iter().map(|r| r.coordinates.as_deref()))),
            Arc::new(Float64Array::from_iter(rows.iter().map(|r| r.area_ha))),
            Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.output_kg))),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn write_csv(rows: &[Producer], path: &str) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    writer.write_record(HEADERS)?;
    for r in rows {
        writer.write_record([
            r.name.clone(),
            r.technician.clone().unwrap_or_default(),
            r.district.clone(),
            r.buyer.clone().unwrap_or_default(),
            r.coordinates.clone().unwrap_or_default(),
            r.area_ha.map(|a| a.to_string()).unwrap_or_default(),
            r.output_kg.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let rows = generate(240, &mut rng);

    write_parquet(&rows, "sample_producers.parquet")?;
    write_csv(&rows, "sample_producers.csv")?;

    println!(
        "Wrote {} producers to sample_producers.parquet and sample_producers.csv",
        rows.len()
    );
    Ok(())
}
