use chrono::NaiveDate;
use hyspec::prelude::*;

fn main() {
    let adult = specify::at_least(18i64);
    let senior = specify::greater_than(64i64);
    let working_age = adult.and_not(&senior);

    let birth_year = Lambda::<NaiveDate, i64>::named("born", |d| {
        Expr::constant(2024i64).sub(d.method(Method::Year, []))
    });
    let spec = working_age.adapt(birth_year).for_any();

    spec.criteria().pretty_print().unwrap();
    println!();

    let family = vec![
        NaiveDate::from_ymd_opt(2015, 4, 2).unwrap(),
        NaiveDate::from_ymd_opt(1988, 11, 23).unwrap(),
    ];
    println!("{}", spec.evaluate(&family));
}
