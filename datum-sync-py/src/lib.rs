use datum_sync::{BmiDatumSync, DatumSyncError};
use pyo3::prelude::*;
use std::error::Error;
use std::path::PathBuf;

#[pymodule]
fn datum_sync(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyBmiDatumSync>()?;
    Ok(())
}

fn to_py_err(err: DatumSyncError) -> PyErr {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        message.push_str(&format!(": {}", inner));
        source = inner.source();
    }

    match err {
        DatumSyncError::UnknownVariable(_)
        | DatumSyncError::Config(_)
        | DatumSyncError::ConfigParse { .. } => {
            PyErr::new::<pyo3::exceptions::PyValueError, _>(message)
        }
        _ => PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(message),
    }
}

#[pyclass(name = "BmiDatumSync")]
pub struct PyBmiDatumSync {
    model: BmiDatumSync,
}

#[pymethods]
impl PyBmiDatumSync {
    #[new]
    fn new() -> Self {
        Self {
            model: BmiDatumSync::new(),
        }
    }

    fn initialize(&mut self, config_file: PathBuf) -> PyResult<()> {
        self.model.initialize(&config_file).map_err(to_py_err)
    }

    fn update(&mut self) -> PyResult<()> {
        self.model.update().map_err(to_py_err)
    }

    fn finalize(&mut self) -> PyResult<()> {
        self.model.finalize().map_err(to_py_err)
    }

    fn get_value(&self, name: &str) -> PyResult<Vec<f64>> {
        self.model.get_value(name).map_err(to_py_err)
    }

    fn set_value(&mut self, name: &str, src: Vec<f64>) -> PyResult<()> {
        self.model.set_value(name, &src).map_err(to_py_err)
    }

    fn get_component_name(&self) -> &'static str {
        self.model.get_component_name()
    }

    fn get_input_var_names(&self) -> Vec<String> {
        self.model.get_input_var_names().to_vec()
    }

    fn get_output_var_names(&self) -> Vec<String> {
        self.model.get_output_var_names().to_vec()
    }

    fn get_input_item_count(&self) -> usize {
        self.model.get_input_item_count()
    }

    fn get_output_item_count(&self) -> usize {
        self.model.get_output_item_count()
    }

    fn get_var_type(&self, name: &str) -> PyResult<&'static str> {
        self.model.get_var_type(name).map_err(to_py_err)
    }

    fn get_var_itemsize(&self, name: &str) -> PyResult<usize> {
        self.model.get_var_itemsize(name).map_err(to_py_err)
    }

    fn get_var_nbytes(&self, name: &str) -> PyResult<usize> {
        self.model.get_var_nbytes(name).map_err(to_py_err)
    }

    fn get_current_time(&self) -> f64 {
        self.model.get_current_time()
    }

    fn z_changed(&self) -> bool {
        self.model.z_changed()
    }

    fn warning(&self) -> Option<String> {
        self.model.warning().map(|w| w.to_string())
    }

    fn __repr__(&self) -> String {
        format!("BmiDatumSync(phase='{}')", self.model.phase())
    }
}
