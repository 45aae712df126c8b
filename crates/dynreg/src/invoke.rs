// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dynamic invoker.
//!
//! Registered functions and methods are stored as a [`Signature`] plus a
//! uniform adapter taking positional [`Args`]. Calls check arity, bind
//! arguments to the declared parameter types, then run the adapter with no
//! registry lock held.
//!
//! # Example
//!
//! ```rust
//! use dynreg::dynamic::{DataType, PrimitiveKind, Value};
//! use dynreg::invoke::{FunctionDescriptor, Signature};
//! use dynreg::Registry;
//!
//! let registry = Registry::new();
//! let int = DataType::Primitive(PrimitiveKind::I64);
//! registry.register_func(
//!     "add",
//!     FunctionDescriptor::new(Signature::new(vec![int.clone(), int]).returns(1), |args| {
//!         Ok(vec![Value::I64(args.get::<i64>(0)? + args.get::<i64>(1)?)])
//!     }),
//! );
//!
//! let out = registry.call_function("add", vec![Value::I32(2), Value::I64(3)]).unwrap();
//! assert_eq!(out, vec![Value::I64(5)]);
//! ```

use crate::coerce;
use crate::dynamic::{DataType, FromValue, Instance, Value};
use crate::registry::Registry;
use crate::{Error, Result};
use std::fmt;

/// Declared parameter types and return arity of a callable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    params: Vec<DataType>,
    variadic: Option<DataType>,
    returns: usize,
}

impl Signature {
    /// Fixed-arity signature.
    pub fn new(params: Vec<DataType>) -> Self {
        Self {
            params,
            variadic: None,
            returns: 0,
        }
    }

    /// Signature accepting any number of trailing `tail` arguments.
    pub fn variadic(params: Vec<DataType>, tail: DataType) -> Self {
        Self {
            params,
            variadic: Some(tail),
            returns: 0,
        }
    }

    /// Set the declared number of results.
    pub fn returns(mut self, count: usize) -> Self {
        self.returns = count;
        self
    }

    /// Fixed parameter types.
    pub fn params(&self) -> &[DataType] {
        &self.params
    }

    /// Element type of the variadic tail.
    pub fn variadic_type(&self) -> Option<&DataType> {
        self.variadic.as_ref()
    }

    pub fn is_variadic(&self) -> bool {
        self.variadic.is_some()
    }

    /// Declared number of results.
    pub fn return_count(&self) -> usize {
        self.returns
    }

    fn accepts(&self, count: usize) -> bool {
        if self.is_variadic() {
            count >= self.params.len()
        } else {
            count == self.params.len()
        }
    }
}

/// Bound positional arguments handed to an adapter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    values: Vec<Value>,
}

impl Args {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Typed argument at `index`.
    pub fn get<T: FromValue>(&self, index: usize) -> Result<T> {
        T::from_value(self.value(index).ok_or(Error::MissingArgument(index))?)
    }

    /// Raw argument at `index`.
    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Arguments from `start` on (the variadic tail).
    pub fn rest(&self, start: usize) -> &[Value] {
        self.values.get(start..).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.values.iter()
    }

    pub fn into_vec(self) -> Vec<Value> {
        self.values
    }
}

type FunctionAdapter = dyn Fn(&Args) -> Result<Vec<Value>> + Send + Sync;
type MethodAdapter = dyn Fn(&mut Instance, &Args) -> Result<Vec<Value>> + Send + Sync;

/// A registered free function.
pub struct FunctionDescriptor {
    signature: Signature,
    adapter: Box<FunctionAdapter>,
}

impl FunctionDescriptor {
    pub fn new<F>(signature: Signature, adapter: F) -> Self
    where
        F: Fn(&Args) -> Result<Vec<Value>> + Send + Sync + 'static,
    {
        Self {
            signature,
            adapter: Box::new(adapter),
        }
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }
}

impl fmt::Debug for FunctionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionDescriptor")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

/// A method in a type's method table.
pub struct MethodDescriptor {
    signature: Signature,
    adapter: Box<MethodAdapter>,
}

impl MethodDescriptor {
    pub fn new<F>(signature: Signature, adapter: F) -> Self
    where
        F: Fn(&mut Instance, &Args) -> Result<Vec<Value>> + Send + Sync + 'static,
    {
        Self {
            signature,
            adapter: Box::new(adapter),
        }
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

impl Registry {
    /// Call a registered function by name.
    pub fn call_function(&self, name: &str, args: Vec<Value>) -> Result<Vec<Value>> {
        let func = self
            .get_func(name)
            .ok_or_else(|| Error::NotRegisteredType(name.to_string()))?;
        let args = self.bind(name, func.signature(), args)?;
        log::trace!("[invoke] {}({} args)", name, args.len());
        let results = (func.adapter)(&args)?;
        check_returns(name, func.signature(), &results);
        Ok(results)
    }

    /// Call a method from the instance type's method table.
    pub fn call_method(
        &self,
        instance: &mut Instance,
        name: &str,
        args: Vec<Value>,
    ) -> Result<Vec<Value>> {
        let qualified = format!("{}.{}", instance.type_name(), name);
        let method = instance
            .descriptor()
            .method(name)
            .ok_or_else(|| Error::InvalidCallTarget(qualified.clone()))?;
        let args = self.bind(&qualified, method.signature(), args)?;
        log::trace!("[invoke] {}({} args)", qualified, args.len());
        let results = (method.adapter)(instance, &args)?;
        check_returns(&qualified, method.signature(), &results);
        Ok(results)
    }

    fn bind(&self, name: &str, signature: &Signature, args: Vec<Value>) -> Result<Args> {
        if !signature.accepts(args.len()) {
            return Err(Error::ArityMismatch {
                name: name.to_string(),
                expected: signature.params().len(),
                got: args.len(),
            });
        }
        let bound = args
            .into_iter()
            .enumerate()
            .map(|(i, value)| match signature.params().get(i) {
                Some(ty) => self.bind_value(value, ty, true),
                None => match signature.variadic_type() {
                    Some(ty) => self.bind_value(value, ty, false),
                    None => value,
                },
            })
            .collect();
        Ok(Args::new(bound))
    }

    fn bind_value(&self, value: Value, ty: &DataType, fixed: bool) -> Value {
        if value.is_null() {
            return if fixed { self.zero_value(ty) } else { Value::Null };
        }
        if value.matches(ty) {
            return value;
        }
        coerce::convert(&value, ty).unwrap_or(value)
    }
}

fn check_returns(name: &str, signature: &Signature, results: &[Value]) {
    if results.len() != signature.return_count() {
        log::warn!(
            "[invoke] {} returned {} values, declared {}",
            name,
            results.len(),
            signature.return_count()
        );
    }
}
