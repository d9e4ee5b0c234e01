use rein_core::{Dialect, Namer, RangeRule, RuleSpec, compile};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dialect = Dialect::postgres();
    let rule = RuleSpec::new(RangeRule::between(1, 12), ["published_month"]).build()?;
    let compiled = compile(&rule, &dialect)?;
    let name = Namer::with_default_prefix(&dialect)?.name_for("books", &rule);
    println!("{name}: CHECK ({})", compiled.sql);
    Ok(())
}
