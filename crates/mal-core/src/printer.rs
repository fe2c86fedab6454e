use std::fmt::Write;

use crate::value::{with_resolved, Value};

/// Render a value as text.
///
/// With `readably` set, strings are quoted and escaped so the output reads
/// back as the same value; otherwise string contents are written raw.
pub fn pr_str(value: &Value, readably: bool) -> String {
    let mut out = String::new();
    write_value(&mut out, value, readably);
    out
}

fn write_value(out: &mut String, value: &Value, readably: bool) {
    match value {
        Value::Nil => out.push_str("nil"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        // f64's Display never uses exponent notation and drops a zero fraction.
        Value::Number(n) => {
            let _ = write!(out, "{n}");
        }
        Value::String(s) => {
            if readably {
                escape_into(out, s);
            } else {
                out.push_str(s);
            }
        }
        Value::Symbol(s) => with_resolved(*s, |name| out.push_str(name)),
        Value::Keyword(s) => with_resolved(*s, |name| {
            out.push(':');
            out.push_str(name);
        }),
        Value::List(items) => write_seq(out, "(", items, ")", readably),
        Value::Vector(items) => write_seq(out, "[", items, "]", readably),
        Value::HashMap(map) => {
            let mut entries: Vec<(String, &Value)> = map
                .iter()
                .map(|(k, v)| (pr_str(k, readably), v))
                .collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            out.push('{');
            for (i, (k, v)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                out.push_str(k);
                out.push(' ');
                write_value(out, v, readably);
            }
            out.push('}');
        }
        Value::Lambda(_) => out.push_str("#<function>"),
        Value::Macro(_) => out.push_str("#<macro>"),
        Value::NativeFn(f) => {
            let _ = write!(out, "#<builtin {}>", f.name);
        }
        Value::Atom(cell) => {
            out.push_str("(atom ");
            write_value(out, &cell.borrow(), readably);
            out.push(')');
        }
    }
}

fn write_seq(out: &mut String, open: &str, items: &[Value], close: &str, readably: bool) {
    out.push_str(open);
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        write_value(out, item, readably);
    }
    out.push_str(close);
}

fn escape_into(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out.push('"');
}
