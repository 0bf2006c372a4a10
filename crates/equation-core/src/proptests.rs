//! Property-based tests for the numeric tower.

use proptest::prelude::*;

use crate::Value;

// Strategy for generating small integers
fn small_int() -> impl Strategy<Value = i64> {
    -1000i64..1000i64
}

// Strategy for generating non-zero integers
fn non_zero_int() -> impl Strategy<Value = i64> {
    prop_oneof![(-1000i64..=-1i64), (1i64..=1000i64)]
}

// Strategy for generating well-behaved floats
fn small_float() -> impl Strategy<Value = f64> {
    (-1e6f64..1e6f64).prop_filter("finite", |f| f.is_finite())
}

proptest! {
    // Tower axioms on the exact (integer) leg

    #[test]
    fn add_commutative(a in small_int(), b in small_int()) {
        let (a, b) = (Value::Integer(a), Value::Integer(b));
        prop_assert_eq!(a.add(&b).unwrap(), b.add(&a).unwrap());
    }

    #[test]
    fn add_associative(a in small_int(), b in small_int(), c in small_int()) {
        let (a, b, c) = (Value::Integer(a), Value::Integer(b), Value::Integer(c));
        prop_assert_eq!(
            a.add(&b).unwrap().add(&c).unwrap(),
            a.add(&b.add(&c).unwrap()).unwrap()
        );
    }

    #[test]
    fn mul_commutative(a in small_int(), b in small_int()) {
        let (a, b) = (Value::Integer(a), Value::Integer(b));
        prop_assert_eq!(a.mul(&b).unwrap(), b.mul(&a).unwrap());
    }

    #[test]
    fn sub_is_add_neg(a in small_int(), b in small_int()) {
        let (a, b) = (Value::Integer(a), Value::Integer(b));
        prop_assert_eq!(a.sub(&b).unwrap(), a.add(&b.neg().unwrap()).unwrap());
    }

    // Modulo contract: result has the divisor's sign and div/mod recompose

    #[test]
    fn rem_sign_follows_divisor(a in small_int(), b in non_zero_int()) {
        let r = Value::Integer(a).rem(&Value::Integer(b)).unwrap();
        let Value::Integer(r) = r else { panic!("integer modulo stayed integral") };
        prop_assert!(r == 0 || (r > 0) == (b > 0));
        prop_assert!(r.abs() < b.abs());
    }

    #[test]
    fn rem_recomposes(a in small_int(), b in non_zero_int()) {
        let r = Value::Integer(a).rem(&Value::Integer(b)).unwrap();
        let Value::Integer(r) = r else { panic!("integer modulo stayed integral") };
        let q = (a - r) / b;
        prop_assert_eq!(q * b + r, a);
    }

    // Promotion: mixing in a float never yields an integer

    #[test]
    fn float_contaminates(a in small_int(), b in small_float()) {
        let r = Value::Integer(a).add(&Value::Float(b)).unwrap();
        prop_assert!(matches!(r, Value::Float(_)));
    }

    // Comparisons are consistent with arithmetic

    #[test]
    fn lt_iff_difference_negative(a in small_int(), b in small_int()) {
        let lt = Value::Integer(a).lt(&Value::Integer(b)).unwrap();
        prop_assert_eq!(lt, Value::Integer(i64::from(a < b)));
    }

    // Canonical display round-trips through a second formatting

    #[test]
    fn display_is_stable(a in small_float()) {
        let s1 = Value::Float(a).to_string();
        let reparsed: f64 = s1.trim_start_matches('(').parse().unwrap();
        prop_assert_eq!(Value::Float(reparsed).to_string(), s1);
    }

    // Logical operators only ever produce 0 or 1

    #[test]
    fn logic_is_boolean(a in small_int(), b in small_int()) {
        let (a, b) = (Value::Integer(a), Value::Integer(b));
        for r in [a.and(&b), a.or(&b), a.xor(&b), a.not()] {
            prop_assert!(matches!(r.unwrap(), Value::Integer(0 | 1)));
        }
    }
}
