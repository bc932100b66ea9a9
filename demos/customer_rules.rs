// Copyright 2025 Cowboy AI, LLC.

//! Customer eligibility rules assembled from named specifications
//!
//! Run with `RUST_LOG=cim_specification=trace` to see combination and
//! compilation events.

use anyhow::Result;
use chrono::{Datelike, Local, NaiveDate};
use cim_specification::{named_specification, not, spec, Expr, Member};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct Customer {
    name: String,
    date_of_birth: NaiveDate,
    member_since: NaiveDate,
}

fn name() -> Member<Customer> {
    Member::string("name", |c: &Customer| c.name.clone())
}

fn date_of_birth() -> Member<Customer> {
    Member::date("date_of_birth", |c: &Customer| c.date_of_birth)
}

fn member_since() -> Member<Customer> {
    Member::date("member_since", |c: &Customer| c.member_since)
}

named_specification! {
    Adult: Customer =
        |c| (Expr::<Customer>::today().year() - c.member(date_of_birth()).year()).ge(21)
}

named_specification! {
    Premium: Customer =
        |c| (Expr::<Customer>::today().year() - c.member(member_since()).year()).gt(10)
}

named_specification! {
    ValidName: Customer =
        |c| c.clone().member(name()).length().gt(0).and_also(c.member(name()).length().lt(10))
}

fn years_ago(years: i32) -> Result<NaiveDate> {
    let year = Local::now().year() - years;
    NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(|| anyhow::anyhow!("no January 1st in {year}"))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let adult = spec::<Adult>()?;
    let valid = spec::<ValidName>()?;
    let premium = spec::<Premium>()?;

    let eligible = adult.and(&valid)?.or(&not(&premium)?)?;
    info!(rule = %eligible, "eligibility rule assembled");

    let predicate = eligible.compile()?;
    let customers = [
        Customer {
            name: "Grace".into(),
            date_of_birth: years_ago(40)?,
            member_since: years_ago(15)?,
        },
        Customer {
            name: "Bartholomew".into(),
            date_of_birth: years_ago(30)?,
            member_since: years_ago(2)?,
        },
        Customer {
            name: "Tim".into(),
            date_of_birth: years_ago(12)?,
            member_since: years_ago(11)?,
        },
    ];

    for customer in &customers {
        let verdict = predicate.evaluate(customer)?;
        info!(customer = %customer.name, eligible = verdict, "evaluated");
        println!("{:<12} eligible: {verdict}", customer.name);
    }

    Ok(())
}
