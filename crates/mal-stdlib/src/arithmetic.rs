use mal_core::{MalError, Value};

use crate::register_fn;

fn number(v: &Value) -> Result<f64, MalError> {
    v.as_number()
        .ok_or_else(|| MalError::type_error("number", v.type_name()))
}

fn numbers(args: &[Value]) -> Result<Vec<f64>, MalError> {
    args.iter().map(number).collect()
}

pub fn register(env: &mal_core::Env) {
    register_fn(env, "+", |args| {
        Ok(Value::Number(numbers(args)?.into_iter().fold(0.0, |acc, n| acc + n)))
    });

    register_fn(env, "*", |args| {
        Ok(Value::Number(numbers(args)?.into_iter().product()))
    });

    register_fn(env, "-", |args| {
        let ns = numbers(args)?;
        match ns.split_first() {
            None => Err(MalError::arity("-", "1+", 0)),
            Some((first, [])) => Ok(Value::Number(-first)),
            Some((first, rest)) => Ok(Value::Number(rest.iter().fold(*first, |acc, n| acc - n))),
        }
    });

    register_fn(env, "/", |args| {
        let ns = numbers(args)?;
        let (first, rest) = match ns.split_first() {
            None => return Err(MalError::arity("/", "1+", 0)),
            Some((first, [])) => (1.0, std::slice::from_ref(first)),
            Some((first, rest)) => (*first, rest),
        };
        let mut acc = first;
        for d in rest {
            if *d == 0.0 {
                return Err(MalError::eval("division by zero"));
            }
            acc /= d;
        }
        Ok(Value::Number(acc))
    });
}

#[cfg(test)]
mod tests {
    use crate::test_util::{call, env, num, nums};
    use mal_core::{MalError, Value};

    #[test]
    fn test_add_and_multiply_identities() {
        let env = env();
        assert_eq!(call(&env, "+", &[]).unwrap(), num(0.0));
        assert_eq!(call(&env, "+", &nums(&[5.0])).unwrap(), num(5.0));
        assert_eq!(call(&env, "+", &nums(&[1.0, 2.0, 3.0])).unwrap(), num(6.0));
        assert_eq!(call(&env, "*", &[]).unwrap(), num(1.0));
        assert_eq!(call(&env, "*", &nums(&[4.0])).unwrap(), num(4.0));
        assert_eq!(call(&env, "*", &nums(&[2.0, 3.0, 4.0])).unwrap(), num(24.0));
    }

    #[test]
    fn test_subtract() {
        let env = env();
        assert_eq!(call(&env, "-", &nums(&[5.0])).unwrap(), num(-5.0));
        assert_eq!(call(&env, "-", &nums(&[10.0, 3.0, 2.0])).unwrap(), num(5.0));
        assert!(matches!(
            call(&env, "-", &[]),
            Err(MalError::Arity { got: 0, .. })
        ));
    }

    #[test]
    fn test_divide() {
        let env = env();
        assert_eq!(call(&env, "/", &nums(&[4.0])).unwrap(), num(0.25));
        assert_eq!(call(&env, "/", &nums(&[12.0, 2.0, 3.0])).unwrap(), num(2.0));
        assert!(matches!(call(&env, "/", &[]), Err(MalError::Arity { .. })));
        assert!(matches!(
            call(&env, "/", &nums(&[1.0, 0.0])),
            Err(MalError::Eval(_))
        ));
        assert!(matches!(
            call(&env, "/", &nums(&[0.0])),
            Err(MalError::Eval(_))
        ));
    }

    #[test]
    fn test_non_numbers_rejected() {
        let env = env();
        assert!(matches!(
            call(&env, "+", &[num(1.0), Value::string("2")]),
            Err(MalError::Type { .. })
        ));
    }
}
