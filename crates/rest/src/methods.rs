use http::Method;

/// The methods registered on one path, in registration order and without duplicates.
///
/// Rendered as the `Access-Control-Allow-Methods` value of the path's `OPTIONS` response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Methods(Vec<Method>);

impl Methods {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a method, ignoring duplicates.
    pub fn add(&mut self, method: Method) {
        if !self.0.contains(&method) {
            self.0.push(method);
        }
    }

    pub fn contains(&self, method: &Method) -> bool {
        self.0.contains(method)
    }

    /// Joins the methods with a comma, `GET,POST`.
    pub fn join(&self) -> String {
        self.0.iter().map(Method::as_str).collect::<Vec<_>>().join(",")
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Method> {
        self.0.iter()
    }
}

impl FromIterator<Method> for Methods {
    fn from_iter<T: IntoIterator<Item = Method>>(iter: T) -> Self {
        let mut methods = Self::new();
        iter.into_iter().for_each(|method| methods.add(method));
        methods
    }
}
