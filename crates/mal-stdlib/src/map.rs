use std::rc::Rc;

use mal_core::{check_arity, MalError, Value};

use crate::register_fn;

type Map = hashbrown::HashMap<Value, Value>;

fn get_map<'a>(v: &'a Value, name: &str) -> Result<&'a Map, MalError> {
    match v {
        Value::HashMap(m) => Ok(m),
        other => Err(MalError::type_error(
            format!("hash-map for {name}"),
            other.type_name(),
        )),
    }
}

fn check_key(key: &Value) -> Result<(), MalError> {
    if key.is_atomic() {
        Ok(())
    } else {
        Err(MalError::type_error("atomic hash-map key", key.type_name()))
    }
}

pub fn register(env: &mal_core::Env) {
    register_fn(env, "hash-map", |args| {
        if args.len() % 2 != 0 {
            return Err(MalError::eval("hash-map: odd number of arguments"));
        }
        let entries = args
            .chunks(2)
            .map(|pair| (pair[0].clone(), pair[1].clone()))
            .collect();
        Value::hashmap(entries)
    });

    register_fn(env, "map?", |args| {
        check_arity!(args, "map?", 1);
        Ok(Value::Bool(matches!(&args[0], Value::HashMap(_))))
    });

    register_fn(env, "assoc", |args| {
        check_arity!(args, "assoc", 1..);
        let mut map = get_map(&args[0], "assoc")?.clone();
        let kvs = &args[1..];
        if kvs.len() % 2 != 0 {
            return Err(MalError::eval("assoc: odd number of key/value arguments"));
        }
        for pair in kvs.chunks(2) {
            check_key(&pair[0])?;
            map.insert(pair[0].clone(), pair[1].clone());
        }
        Ok(Value::HashMap(Rc::new(map)))
    });

    register_fn(env, "dissoc", |args| {
        check_arity!(args, "dissoc", 1..);
        let mut map = get_map(&args[0], "dissoc")?.clone();
        for key in &args[1..] {
            map.remove(key);
        }
        Ok(Value::HashMap(Rc::new(map)))
    });

    register_fn(env, "get", |args| {
        check_arity!(args, "get", 2);
        match &args[0] {
            Value::Nil => Ok(Value::Nil),
            other => Ok(get_map(other, "get")?
                .get(&args[1])
                .cloned()
                .unwrap_or(Value::Nil)),
        }
    });

    register_fn(env, "contains?", |args| {
        check_arity!(args, "contains?", 2);
        Ok(Value::Bool(get_map(&args[0], "contains?")?.contains_key(&args[1])))
    });

    register_fn(env, "keys", |args| {
        check_arity!(args, "keys", 1);
        Ok(Value::list(get_map(&args[0], "keys")?.keys().cloned().collect()))
    });

    register_fn(env, "vals", |args| {
        check_arity!(args, "vals", 1);
        Ok(Value::list(get_map(&args[0], "vals")?.values().cloned().collect()))
    });
}

#[cfg(test)]
mod tests {
    use crate::test_util::{call, env, num};
    use mal_core::{MalError, Value};

    fn kw(s: &str) -> Value {
        Value::keyword(s)
    }

    #[test]
    fn test_hash_map_and_get() {
        let env = env();
        let m = call(&env, "hash-map", &[kw("a"), num(1.0), Value::string("b"), num(2.0)]).unwrap();
        assert_eq!(call(&env, "get", &[m.clone(), kw("a")]).unwrap(), num(1.0));
        assert_eq!(call(&env, "get", &[m.clone(), Value::string("b")]).unwrap(), num(2.0));
        assert_eq!(call(&env, "get", &[m, kw("zzz")]).unwrap(), Value::Nil);
        assert_eq!(call(&env, "get", &[Value::Nil, kw("a")]).unwrap(), Value::Nil);
    }

    #[test]
    fn test_hash_map_rejects_bad_input() {
        let env = env();
        assert!(call(&env, "hash-map", &[kw("a")]).is_err());
        assert!(matches!(
            call(&env, "hash-map", &[Value::list(vec![]), num(1.0)]),
            Err(MalError::Type { .. })
        ));
    }

    #[test]
    fn test_assoc_dissoc_are_persistent() {
        let env = env();
        let m = call(&env, "hash-map", &[kw("a"), num(1.0)]).unwrap();
        let m2 = call(&env, "assoc", &[m.clone(), kw("b"), num(2.0)]).unwrap();
        let m3 = call(&env, "dissoc", &[m2.clone(), kw("a")]).unwrap();
        assert_eq!(call(&env, "count", &[m.clone()]).unwrap(), num(1.0));
        assert_eq!(call(&env, "count", &[m2.clone()]).unwrap(), num(2.0));
        assert_eq!(
            call(&env, "contains?", &[m3.clone(), kw("a")]).unwrap(),
            Value::Bool(false)
        );
        assert_eq!(
            call(&env, "contains?", &[m2, kw("a")]).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(call(&env, "keys", &[m3]).unwrap(), Value::list(vec![kw("b")]));
        assert!(call(&env, "assoc", &[m, kw("x")]).is_err());
    }

    #[test]
    fn test_vals() {
        let env = env();
        let m = call(&env, "hash-map", &[kw("a"), num(7.0)]).unwrap();
        assert_eq!(call(&env, "vals", &[m]).unwrap(), Value::list(vec![num(7.0)]));
        assert_eq!(
            call(&env, "map?", &[Value::Nil]).unwrap(),
            Value::Bool(false)
        );
    }
}
