use burn::tensor::{backend::Backend, Tensor, TensorData};

use super::error::PolicyError;

/// Host float data that can be uploaded as a `D`-dimensional tensor.
pub trait ToTensorF<const D: usize>: Clone {
    fn to_tensor<B: Backend>(self, device: &B::Device) -> Result<Tensor<B, D>, PolicyError>;
}

impl ToTensorF<1> for Vec<f32> {
    fn to_tensor<B: Backend>(self, device: &B::Device) -> Result<Tensor<B, 1>, PolicyError> {
        let n = self.len();

        Ok(Tensor::from_data(TensorData::new(self, [n]), device))
    }
}

/// Rows become the batch dimension. Every row must have the same width.
impl ToTensorF<2> for Vec<Vec<f32>> {
    fn to_tensor<B: Backend>(self, device: &B::Device) -> Result<Tensor<B, 2>, PolicyError> {
        let n0 = self.len();
        let n1 = self.first().map(|r| r.len()).unwrap_or(0);

        if let Some(bad) = self.iter().find(|r| r.len() != n1) {
            return Err(PolicyError::ShapeMismatch {
                what: "row width".to_string(),
                expected: n1,
                got: bad.len(),
            });
        }

        let data: Vec<f32> = self.concat();

        Ok(Tensor::from_data(TensorData::new(data, [n0, n1]), device))
    }
}

/// Reads a (rows, cols) tensor back into host rows.
pub fn tensor_to_rows<B: Backend>(t: Tensor<B, 2>) -> Result<Vec<Vec<f32>>, PolicyError> {
    let [_, n1] = t.dims();
    let data = t
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| PolicyError::Data(format!("{e:?}")))?;

    if n1 == 0 {
        return Ok(Vec::new());
    }

    Ok(data.chunks(n1).map(|c| c.to_vec()).collect())
}

#[cfg(test)]
mod test {
    use burn::{backend::NdArray, tensor::Tensor};

    use crate::common::error::PolicyError;

    use super::{tensor_to_rows, ToTensorF};

    #[test]
    fn test_to_tensor_vec_f32() {
        let d: Vec<f32> = vec![1.1, 2.2];
        let t: Tensor<NdArray, 1> = d.to_tensor(&Default::default()).unwrap();

        assert_eq!(t.shape().dims.len(), 1);
        assert_eq!(t.shape().dims, [2]);
    }

    #[test]
    fn test_to_tensor_vec_vec_f32() {
        let d: Vec<Vec<f32>> = vec![vec![1.1, 2.2], vec![3.3, 4.4], vec![1.0, 0.0]];
        let t: Tensor<NdArray, 2> = d.clone().to_tensor(&Default::default()).unwrap();

        assert_eq!(t.shape().dims.len(), 2);
        assert_eq!(t.shape().dims, [3, 2]);

        assert_eq!(tensor_to_rows(t).unwrap(), d);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let d: Vec<Vec<f32>> = vec![vec![1.0, 2.0], vec![3.0]];
        let t: Result<Tensor<NdArray, 2>, _> = d.to_tensor(&Default::default());

        assert_eq!(
            t.unwrap_err(),
            PolicyError::ShapeMismatch {
                what: "row width".to_string(),
                expected: 2,
                got: 1
            }
        );
    }
}
