use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Date32Array, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
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

    fn below(&mut self, n: usize) -> usize {
        (self.next_f64() * n as f64) as usize % n
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.below(items.len())]
    }

    /// True with probability `p`.
    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

const ROWS: usize = 400;

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    let lines = [
        ("C57BL/6J-Tg(APP)", "APP"),
        ("B6.129-Trp53tm1", "P53KO"),
        ("C57BL/6N-Cre", "CRE"),
        ("BALB/c-Foxn1nu", "NUDE"),
    ];
    let strains = ["C57BL/6J", "C57BL/6N", "BALB/c", "129S"];
    let genes = ["APP", "Trp53", "Cre", "Foxn1", "wt"];
    let crosses = ["Het x WT", "Het x Het", "WT x WT", "Hom x WT"];

    let reference = NaiveDate::from_ymd_opt(2024, 1, 1).context("reference date")?;
    let earliest = NaiveDate::from_ymd_opt(2018, 1, 1).context("earliest date")?;
    let span_days = (reference - earliest).num_days() as usize;
    let epoch = NaiveDate::default();

    let mut linea: Vec<&str> = Vec::with_capacity(ROWS);
    let mut acronimo: Vec<&str> = Vec::with_capacity(ROWS);
    let mut sexo: Vec<Option<&str>> = Vec::with_capacity(ROWS);
    let mut cepa: Vec<&str> = Vec::with_capacity(ROWS);
    let mut jaula: Vec<String> = Vec::with_capacity(ROWS);
    let mut cruce: Vec<&str> = Vec::with_capacity(ROWS);
    let mut nacimiento: Vec<Option<i32>> = Vec::with_capacity(ROWS);
    let mut edad: Vec<Option<i64>> = Vec::with_capacity(ROWS);
    let mut gen: Vec<&str> = Vec::with_capacity(ROWS);
    let mut peso: Vec<Option<f64>> = Vec::with_capacity(ROWS);
    let mut sala: Vec<&str> = Vec::with_capacity(ROWS);

    for _ in 0..ROWS {
        let (line, acronym) = lines[rng.below(lines.len())];
        linea.push(line);
        acronimo.push(acronym);
        sexo.push(if rng.chance(0.05) {
            None
        } else {
            Some(rng.pick(&["M", "F"]))
        });
        cepa.push(rng.pick(&strains));
        jaula.push(format!("J-{:03}", rng.below(60) + 1));
        cruce.push(rng.pick(&crosses));
        gen.push(rng.pick(&genes));
        sala.push("Animalario 1");

        if rng.chance(0.03) {
            nacimiento.push(None);
            edad.push(None);
            peso.push(None);
        } else {
            let born = earliest + chrono::Duration::days(rng.below(span_days) as i64);
            let age = (reference - born).num_days();
            nacimiento.push(Some((born - epoch).num_days() as i32));
            edad.push(Some(age));
            peso.push(Some(15.0 + (age.min(120) as f64) * 0.1 + rng.next_f64() * 5.0));
        }
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("Linea", DataType::Utf8, false),
        Field::new("Acrónimo línea", DataType::Utf8, false),
        Field::new("Sexo", DataType::Utf8, true),
        Field::new("Cepa", DataType::Utf8, false),
        Field::new("Jaula", DataType::Utf8, false),
        Field::new("Cruce origen", DataType::Utf8, false),
        Field::new("F. nacimiento", DataType::Date32, true),
        Field::new("Edad (días)", DataType::Int64, true),
        Field::new("Gen", DataType::Utf8, false),
        Field::new("Peso (g)", DataType::Float64, true),
        Field::new("Sala", DataType::Utf8, false),
    ]));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(linea)),
        Arc::new(StringArray::from(acronimo)),
        Arc::new(StringArray::from(sexo)),
        Arc::new(StringArray::from(cepa)),
        Arc::new(StringArray::from(jaula)),
        Arc::new(StringArray::from(cruce)),
        Arc::new(Date32Array::from(nacimiento)),
        Arc::new(Int64Array::from(edad)),
        Arc::new(StringArray::from(gen)),
        Arc::new(Float64Array::from(peso)),
        Arc::new(StringArray::from(sala)),
    ];

    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    // Write Parquet
    let output_path = "sample_inventory.parquet";
    let file = std::fs::File::create(output_path).context("creating output file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing writer")?;

    println!("Wrote {ROWS} inventory rows to {output_path}");
    Ok(())
}
